use serde::{Deserialize, Serialize};

/// A verified user identity.
///
/// `subject_id` is the provider-scoped, immutable user id. Resource handlers
/// use it as the ownership key for every row they read or write; the other
/// fields are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider subject (`sub`).
    #[serde(rename = "id")]
    pub subject_id: String,
    /// The user's email address, if the provider shared it.
    pub email: Option<String>,
    /// The user's display name.
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    /// URL of the user's avatar.
    #[serde(rename = "picture")]
    pub picture_url: Option<String>,
}

impl Identity {
    /// Creates an identity with only the subject set.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: None,
            display_name: None,
            picture_url: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = Some(url.into());
        self
    }
}

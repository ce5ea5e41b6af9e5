use chrono::{DateTime, Utc};

/// A freshly signed token together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded, signed token.
    pub token: String,
    /// When the token stops verifying.
    pub expires_at: DateTime<Utc>,
}

/// The access/refresh pair handed out on login and on every refresh.
///
/// Nothing about the pair is kept server-side; both halves live only in
/// the client's cookies until they expire.
#[derive(Debug, Clone)]
pub struct SessionPair {
    /// Short-lived token authorizing API calls.
    pub access: IssuedToken,
    /// Longer-lived token accepted only by the refresh endpoint.
    pub refresh: IssuedToken,
}

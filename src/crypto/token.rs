//! Signed, self-contained session tokens.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. Nothing is
//! stored server-side: a token is valid for exactly as long as its signature
//! checks out and its `exp` claim lies in the future.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::identity::Identity;
use crate::models::session::IssuedToken;

/// The only signature algorithm this codec issues or accepts.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a token failed to verify.
///
/// These stay internal. Callers over HTTP only ever see a uniform 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be decoded.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not match, or the token was signed some other way.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The signature is valid but `exp` is not in the future.
    #[error("token has expired")]
    Expired,

    /// Building a token failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// What a token may be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authorizes API calls.
    #[default]
    Access,
    /// Only accepted by the refresh endpoint.
    Refresh,
}

/// The claim set carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Missing on tokens that predate explicit kinds; those were access tokens.
    #[serde(rename = "type", default)]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: Option<Uuid>,
}

impl Claims {
    /// Rebuilds the identity the token was issued for.
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.sub.clone(),
            email: self.email.clone(),
            display_name: self.name.clone(),
            picture_url: self.picture.clone(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Issues and verifies tokens with a borrowed signing secret.
#[derive(Clone, Copy)]
pub struct TokenCodec<'a> {
    secret: &'a [u8],
}

impl<'a> TokenCodec<'a> {
    pub fn new(secret: &'a [u8]) -> Self {
        Self { secret }
    }

    /// Issues a token of `kind` for `identity`, valid for `ttl` from now.
    pub fn issue(
        &self,
        identity: &Identity,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, kind, ttl, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| TokenError::Encoding("expiry overflows".to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Encoding("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: identity.subject_id.clone(),
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            picture: identity.picture_url.clone(),
            kind,
            iat,
            exp,
            jti: Some(Uuid::new_v4()),
        };

        Ok(IssuedToken {
            token: self.encode(&claims)?,
            expires_at,
        })
    }

    /// Verifies `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as if the current time were `now`.
    ///
    /// The signature is checked before the payload is parsed, so claims are
    /// never read from a token this process did not sign. Expiry is judged
    /// against `now` rather than the library's clock, and a token is already
    /// expired at its `exp` second.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret),
            &Self::validation(),
        )?;
        let claims = data.claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation
    }

    fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            claims,
            &EncodingKey::from_secret(self.secret),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

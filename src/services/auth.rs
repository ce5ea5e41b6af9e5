use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::crypto::token::TokenKind;
use crate::error::{AppError, Result};
use crate::models::identity::Identity;
use crate::models::session::SessionPair;

/// Issues a fresh access/refresh pair for `identity`.
///
/// # Arguments
///
/// * `config` - Supplies the signing secret and both TTLs.
/// * `identity` - Who the tokens are for.
/// * `now` - Issue time.
pub fn issue_session(config: &Config, identity: &Identity, now: DateTime<Utc>) -> Result<SessionPair> {
    let codec = config.token_codec();

    let access = codec
        .issue_at(identity, TokenKind::Access, config.access_ttl, now)
        .map_err(|e| AppError::Internal(format!("Access token issuance failed: {}", e)))?;
    let refresh = codec
        .issue_at(identity, TokenKind::Refresh, config.refresh_ttl, now)
        .map_err(|e| AppError::Internal(format!("Refresh token issuance failed: {}", e)))?;

    tracing::debug!(subject = %identity.subject_id, "🔑 Session pair issued");
    Ok(SessionPair { access, refresh })
}

/// Trades a valid refresh token for a brand-new pair.
///
/// The identity comes from the refresh token's own claims. The presented
/// token is not invalidated and keeps working until its own expiry.
pub fn rotate(config: &Config, refresh_token: &str, now: DateTime<Utc>) -> Result<SessionPair> {
    let claims = config.token_codec().verify_at(refresh_token, now)?;

    if claims.kind != TokenKind::Refresh {
        tracing::warn!(subject = %claims.sub, "❌ Non-refresh token presented for rotation");
        return Err(AppError::Unauthorized);
    }

    let identity = claims.identity();
    let pair = issue_session(config, &identity, now)?;

    tracing::info!(subject = %identity.subject_id, "🔄 Session rotated");
    Ok(pair)
}

/// Resolves the caller's identity from an access token.
pub fn resolve(config: &Config, access_token: &str, now: DateTime<Utc>) -> Result<Identity> {
    let claims = config.token_codec().verify_at(access_token, now)?;

    if claims.kind != TokenKind::Access {
        tracing::warn!(subject = %claims.sub, "❌ Non-access token presented as access token");
        return Err(AppError::Unauthorized);
    }

    Ok(claims.identity())
}

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    services::{auth as auth_service, cookies::ACCESS_COOKIE},
    state::AppState,
};

/// Extracts the access token from the request cookies.
fn extract_access_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(ACCESS_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// A middleware that requires a valid access token.
///
/// On success the caller's [`Identity`](crate::models::identity::Identity)
/// is inserted into the request extensions for downstream handlers, which
/// must scope every owned-resource query by its `subject_id`. A missing
/// cookie and a bad token produce the same 401.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_access_token(&cookies).ok_or_else(|| {
        tracing::debug!("❌ No access_token cookie found");
        AppError::Unauthorized
    })?;

    let identity = auth_service::resolve(&state.config, &token, Utc::now())?;

    tracing::debug!("✅ User authenticated: {}", identity.subject_id);

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::identity::Identity,
    services::{
        auth as auth_service,
        cookies::{self as cookie_service, REFRESH_COOKIE},
        oauth::{self, ExchangeError},
    },
    state::AppState,
    validation::auth::return_path_or_default,
};

/// Query parameters the provider sends back to the callback.
#[derive(Deserialize, Debug)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Query parameters for starting a login.
#[derive(Deserialize, Debug)]
pub struct LoginParams {
    /// Path to land on once logged in.
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: Identity,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Returns the caller's identity.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(MeResponse { user: identity })
}

/// Rotates the session from the refresh cookie.
#[axum::debug_handler]
pub async fn refresh(State(state): State<AppState>, cookies: Cookies) -> Result<Json<OkResponse>> {
    let refresh_token = cookies
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!("❌ No refresh_token cookie found");
            AppError::Unauthorized
        })?;

    let now = Utc::now();
    let pair = auth_service::rotate(&state.config, &refresh_token, now)?;
    cookie_service::apply(&cookies, &state.config.cookie_policy, &pair, now);

    Ok(Json(OkResponse { ok: true }))
}

/// Clears the session cookies.
///
/// Tokens are stateless, so anything the client kept keeps working until it
/// expires.
pub async fn logout(cookies: Cookies) -> Json<OkResponse> {
    cookie_service::clear(&cookies);
    tracing::info!("👋 Session cookies cleared on logout");

    Json(OkResponse { ok: true })
}

/// Sends the browser to the provider's consent screen.
#[axum::debug_handler]
pub async fn google_login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response> {
    let google = &state.config.google;
    let client_id = google
        .client_id
        .as_deref()
        .ok_or(ExchangeError::MissingCredentials)?;

    let redirect_uri = oauth::resolve_redirect_uri(google, &headers, &uri)?;
    let return_path = return_path_or_default(params.next.as_deref());
    let url = oauth::authorization_url(google, client_id, &redirect_uri, return_path)?;

    tracing::debug!(redirect_uri = %redirect_uri, "🔐 Starting Google login");
    Ok(found(&url))
}

/// Completes a Google login and redirects back to the frontend.
#[axum::debug_handler]
pub async fn google_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response> {
    if let (Some(error), None) = (&params.error, &params.code) {
        tracing::warn!(error = %error, "❌ Provider returned an error instead of a code");
    }

    let identity = oauth::complete_login(
        &state.config,
        &state.provider,
        params.code.as_deref(),
        &headers,
        &uri,
    )
    .await?;

    let now = Utc::now();
    let pair = auth_service::issue_session(&state.config, &identity, now)?;
    cookie_service::apply(&cookies, &state.config.cookie_policy, &pair, now);

    let return_path = return_path_or_default(params.state.as_deref());
    let target = oauth::redirect_target(&state.config.frontend_origin, return_path);

    tracing::info!("✅ User logged in: {}", identity.subject_id);
    Ok(found(&target))
}

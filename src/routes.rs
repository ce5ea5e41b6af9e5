use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::{handlers, middleware_layer, services::oauth::CALLBACK_PATH, state::AppState};

/// Routes that need no session.
pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/google/login", get(handlers::auth::google_login))
        .route(CALLBACK_PATH, get(handlers::auth::google_callback))
        .with_state(state)
}

/// Routes that require a valid access token.
///
/// Resource endpoints belong here; handlers read the caller's
/// [`Identity`](crate::models::identity::Identity) from the request
/// extensions.
pub fn protected_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state)
}

/// Assembles the full application router with tracing and cookie handling.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(public_routes(state.clone()))
        .merge(protected_routes(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
}

/// Credentialed CORS for the configured frontend origins.
///
/// Session cookies travel on their own; scripts only ever send JSON headers.
pub fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::crypto::token::TokenError;
use crate::services::oauth::ExchangeError;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A session token failed verification.
    #[error("Token verification failed: {0}")]
    Token(#[from] TokenError),

    /// No usable credential was presented.
    #[error("Unauthorized")]
    Unauthorized,

    /// The OAuth2 login exchange failed.
    #[error(transparent)]
    OAuth(#[from] ExchangeError),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Body of every 401, whatever the underlying cause.
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Token(ref e) => {
                tracing::debug!("Token rejected: {}", e);
                (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
            }

            AppError::Unauthorized => {
                tracing::debug!("Request without valid credentials");
                (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
            }

            AppError::OAuth(ref e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    tracing::error!("OAuth misconfiguration: {}", e);
                } else {
                    tracing::warn!("OAuth login failed: {}", e);
                }
                (status, e.to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

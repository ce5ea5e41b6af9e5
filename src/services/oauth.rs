//! Authorization-code exchange against the identity provider.
//!
//! A callback moves through: input validation, redirect URI resolution,
//! code-for-token exchange, identity token verification, and finally an
//! [`Identity`]. Each step has its own [`ExchangeError`] variant and nothing
//! is retried; a failed login has to be restarted by the client.

use axum::http::{HeaderMap, StatusCode, Uri, header};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::{Config, GoogleConfig};
use crate::models::identity::Identity;

/// Path of the callback route, as registered with the provider.
pub const CALLBACK_PATH: &str = "/api/auth/google/callback";

/// Failures of the login exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("Missing Host header")]
    MissingHost,

    #[error("Missing Google OAuth credentials")]
    MissingCredentials,

    #[error("Invalid provider URL: {0}")]
    InvalidProviderUrl(String),

    /// The token endpoint refused the code; carries the provider's body.
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Missing id_token in response")]
    MissingIdentityToken,

    #[error("Invalid ID token: {0}")]
    InvalidIdentityToken(String),

    /// The identity token was issued to a different client.
    #[error("ID token audience mismatch")]
    AudienceMismatch,
}

impl ExchangeError {
    /// Server-side misconfiguration is a 500; everything else is the
    /// caller's or the provider's problem.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidProviderUrl(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Client id and secret, both present.
pub struct Credentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

impl<'a> Credentials<'a> {
    pub fn from_config(google: &'a GoogleConfig) -> Result<Self, ExchangeError> {
        match (google.client_id.as_deref(), google.client_secret.as_deref()) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id,
                client_secret: client_secret.as_str(),
            }),
            _ => Err(ExchangeError::MissingCredentials),
        }
    }
}

#[derive(Deserialize)]
struct ProviderTokens {
    #[serde(default)]
    id_token: Option<String>,
}

/// Claims returned by the tokeninfo endpoint.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// HTTP client for the identity provider's endpoints.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
}

impl ProviderClient {
    /// Creates a client whose every request is bounded by `google.timeout`.
    pub fn new(google: &GoogleConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(google.timeout).build()?;
        Ok(Self { http })
    }

    /// Trades an authorization code for the provider's identity token.
    pub async fn exchange_code(
        &self,
        google: &GoogleConfig,
        credentials: &Credentials<'_>,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, ExchangeError> {
        let params = [
            ("code", code),
            ("client_id", credentials.client_id),
            ("client_secret", credentials.client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&google.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "❌ Token endpoint unreachable");
                ExchangeError::ExchangeFailed(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::ExchangeFailed(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = %status, body = %body, "❌ Token exchange rejected");
            return Err(ExchangeError::ExchangeFailed(body));
        }

        let tokens: ProviderTokens = sonic_rs::from_str(&body).map_err(|e| {
            ExchangeError::ExchangeFailed(format!("unreadable token response: {}", e))
        })?;

        tokens
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or(ExchangeError::MissingIdentityToken)
    }

    /// Verifies an identity token with the provider and checks it was
    /// issued to `client_id`.
    pub async fn verify_identity_token(
        &self,
        google: &GoogleConfig,
        client_id: &str,
        id_token: &str,
    ) -> Result<Identity, ExchangeError> {
        let response = self
            .http
            .get(&google.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "❌ Tokeninfo endpoint unreachable");
                ExchangeError::InvalidIdentityToken(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::InvalidIdentityToken(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = %status, "❌ Identity token rejected by provider");
            return Err(ExchangeError::InvalidIdentityToken(body));
        }

        let info: TokenInfo = sonic_rs::from_str(&body).map_err(|e| {
            ExchangeError::InvalidIdentityToken(format!("unreadable tokeninfo response: {}", e))
        })?;

        identity_from_token_info(info, client_id)
    }
}

fn identity_from_token_info(info: TokenInfo, client_id: &str) -> Result<Identity, ExchangeError> {
    if info.aud.as_deref() != Some(client_id) {
        tracing::warn!(aud = ?info.aud, "❌ Identity token issued for another client");
        return Err(ExchangeError::AudienceMismatch);
    }

    let subject_id = info
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| ExchangeError::InvalidIdentityToken("missing subject".to_string()))?;

    let display_name = info.name.or_else(|| info.email.clone());

    Ok(Identity {
        subject_id,
        email: info.email,
        display_name,
        picture_url: info.picture,
    })
}

/// Returns the redirect URI the provider expects for this deployment.
///
/// An explicit override wins. Otherwise the URI is rebuilt from the inbound
/// request and must match what is registered with the provider. The scheme
/// comes from the request itself unless forwarded headers are trusted.
pub fn resolve_redirect_uri(
    google: &GoogleConfig,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<String, ExchangeError> {
    if let Some(redirect_uri) = &google.redirect_uri {
        return Ok(redirect_uri.clone());
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .ok_or(ExchangeError::MissingHost)?;

    let scheme = request_scheme(headers, uri, google.trust_forwarded_proto);
    Ok(format!("{}://{}{}", scheme, host, CALLBACK_PATH))
}

fn request_scheme(headers: &HeaderMap, uri: &Uri, trust_forwarded: bool) -> &'static str {
    let forwarded = headers
        .get("x-forwarded-proto")
        .filter(|_| trust_forwarded)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);

    match forwarded.or(uri.scheme_str()) {
        Some(scheme) if scheme.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

/// Builds the provider's consent-screen URL for a login starting here.
pub fn authorization_url(
    google: &GoogleConfig,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<String, ExchangeError> {
    let mut url = Url::parse(&google.auth_url)
        .map_err(|e| ExchangeError::InvalidProviderUrl(format!("{}: {}", google.auth_url, e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &google.scopes)
        .append_pair("state", state);

    Ok(url.into())
}

/// Runs a callback from its query parameters to a verified identity.
pub async fn complete_login(
    config: &Config,
    provider: &ProviderClient,
    code: Option<&str>,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Identity, ExchangeError> {
    let code = code
        .filter(|code| !code.is_empty())
        .ok_or(ExchangeError::MissingCode)?;
    let credentials = Credentials::from_config(&config.google)?;
    let redirect_uri = resolve_redirect_uri(&config.google, headers, uri)?;

    tracing::debug!(redirect_uri = %redirect_uri, "🔐 Exchanging authorization code");
    let id_token = provider
        .exchange_code(&config.google, &credentials, code, &redirect_uri)
        .await?;

    let identity = provider
        .verify_identity_token(&config.google, credentials.client_id, &id_token)
        .await?;

    tracing::info!(subject = %identity.subject_id, "✅ Identity verified with provider");
    Ok(identity)
}

/// Where the browser goes after a successful login.
pub fn redirect_target(frontend_origin: &str, return_path: &str) -> String {
    format!("{}{}", frontend_origin, return_path)
}

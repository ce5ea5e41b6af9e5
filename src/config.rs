use std::env;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use zeroize::Zeroizing;

use crate::crypto::token::TokenCodec;
use crate::crypto::ttl::ttl_or_default;
use crate::services::cookies::{CookiePolicy, SameSiteMode};

/// Signing secret used outside production when `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "dev_cooktube_secret_change_me";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_SCOPES: &str = "openid email profile";

/// Identity provider settings.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth2 client id. Also the audience every identity token must carry.
    pub client_id: Option<String>,
    /// OAuth2 client secret.
    pub client_secret: Option<Zeroizing<String>>,
    /// Explicit redirect URI; derived from the request when unset.
    pub redirect_uri: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    pub tokeninfo_url: String,
    /// Space-separated scopes requested at login.
    pub scopes: String,
    /// Upper bound on each outbound provider call.
    pub timeout: StdDuration,
    /// Take the redirect scheme from `X-Forwarded-Proto`. Only safe behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_proto: bool,
}

/// The application's configuration.
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Clone)]
pub struct Config {
    /// Address the server binds to.
    pub host: String,
    pub port: u16,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
    /// HMAC secret for session tokens.
    pub signing_secret: Zeroizing<Vec<u8>>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub google: GoogleConfig,
    /// Base URL the login callback redirects back to, without trailing slash.
    pub frontend_origin: String,
    pub cookie_policy: CookiePolicy,
    /// Whether the process runs as a production deployment.
    pub production: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` reading each variable through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("production"));

        let signing_secret = match var("JWT_SECRET") {
            Some(secret) => Zeroizing::new(secret.into_bytes()),
            None if production => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            None => {
                tracing::warn!("⚠️ JWT_SECRET not set, using the development secret");
                Zeroizing::new(DEV_JWT_SECRET.as_bytes().to_vec())
            }
        };

        let access_ttl = ttl_or_default(
            "ACCESS_TOKEN_TTL",
            &var("ACCESS_TOKEN_TTL").unwrap_or_else(|| "15m".to_string()),
        );
        let refresh_ttl = ttl_or_default(
            "REFRESH_TOKEN_TTL",
            &var("REFRESH_TOKEN_TTL").unwrap_or_else(|| "7d".to_string()),
        );

        let same_site = match var("COOKIE_SAMESITE") {
            None => SameSiteMode::Lax,
            Some(raw) => SameSiteMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "⚠️ Unknown COOKIE_SAMESITE, using lax");
                SameSiteMode::Lax
            }),
        };

        let timeout_secs: u64 = match var("OAUTH_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("Invalid OAUTH_HTTP_TIMEOUT_SECS")?,
            None => 10,
        };

        let google = GoogleConfig {
            client_id: var("GOOGLE_CLIENT_ID"),
            client_secret: var("GOOGLE_CLIENT_SECRET").map(Zeroizing::new),
            redirect_uri: var("OAUTH_REDIRECT_URI"),
            auth_url: var("GOOGLE_AUTH_URL").unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
            token_url: var("GOOGLE_TOKEN_URL").unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            tokeninfo_url: var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|| GOOGLE_TOKENINFO_URL.to_string()),
            scopes: var("GOOGLE_SCOPES").unwrap_or_else(|| GOOGLE_SCOPES.to_string()),
            timeout: StdDuration::from_secs(timeout_secs),
            trust_forwarded_proto: var("TRUST_FORWARDED_PROTO").is_some_and(|v| {
                matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            }),
        };

        Ok(Self {
            host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("API_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .trim()
                .parse()
                .context("Invalid API_PORT")?,
            cors_origins: var("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            signing_secret,
            access_ttl,
            refresh_ttl,
            google,
            frontend_origin: var("FRONTEND_ORIGIN")
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .unwrap_or_default(),
            cookie_policy: CookiePolicy::new(same_site, production),
            production,
        })
    }

    /// A token codec bound to this configuration's signing secret.
    pub fn token_codec(&self) -> TokenCodec<'_> {
        TokenCodec::new(&self.signing_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert!(!config.production);
        assert_eq!(config.signing_secret.as_slice(), DEV_JWT_SECRET.as_bytes());
        assert_eq!(config.access_ttl.num_seconds(), 900);
        assert_eq!(config.refresh_ttl.num_seconds(), 604_800);
        assert_eq!(config.cookie_policy.same_site(), SameSiteMode::Lax);
        assert!(!config.cookie_policy.secure());
        assert_eq!(config.frontend_origin, "");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert!(config.google.client_id.is_none());
        assert_eq!(config.google.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.google.timeout, StdDuration::from_secs(10));
        assert!(!config.google.trust_forwarded_proto);
    }

    #[test]
    fn forwarded_proto_is_trusted_only_when_enabled() {
        let trusted = |raw: &str| {
            config_from(&[("TRUST_FORWARDED_PROTO", raw)])
                .unwrap()
                .google
                .trust_forwarded_proto
        };

        assert!(trusted("true"));
        assert!(trusted("1"));
        assert!(!trusted("off"));
    }

    #[test]
    fn production_requires_a_signing_secret() {
        assert!(config_from(&[("APP_ENV", "production")]).is_err());
        assert!(config_from(&[("NODE_ENV", "production"), ("JWT_SECRET", "s3cret")]).is_ok());
    }

    #[test]
    fn production_makes_cookies_secure() {
        let config = config_from(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap();

        assert!(config.production);
        assert!(config.cookie_policy.secure());
    }

    #[test]
    fn same_site_none_forces_secure_outside_production() {
        let config = config_from(&[("COOKIE_SAMESITE", "None")]).unwrap();

        assert_eq!(config.cookie_policy.same_site(), SameSiteMode::None);
        assert!(config.cookie_policy.secure());
    }

    #[test]
    fn unknown_same_site_falls_back_to_lax() {
        let config = config_from(&[("COOKIE_SAMESITE", "sideways")]).unwrap();

        assert_eq!(config.cookie_policy.same_site(), SameSiteMode::Lax);
    }

    #[test]
    fn bad_ttl_falls_back_instead_of_failing() {
        let config = config_from(&[("ACCESS_TOKEN_TTL", "soon"), ("REFRESH_TOKEN_TTL", "30d")])
            .unwrap();

        assert_eq!(config.access_ttl.num_seconds(), 900);
        assert_eq!(config.refresh_ttl.num_seconds(), 30 * 86_400);
    }

    #[test]
    fn empty_values_count_as_unset_and_origin_is_trimmed() {
        let config = config_from(&[
            ("GOOGLE_CLIENT_ID", ""),
            ("FRONTEND_ORIGIN", "https://app.example.com/"),
            ("CORS_ORIGINS", "https://a.example.com, https://b.example.com,"),
        ])
        .unwrap();

        assert!(config.google.client_id.is_none());
        assert_eq!(config.frontend_origin, "https://app.example.com");
        assert_eq!(
            config.cors_origins,
            vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ]
        );
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(config_from(&[("API_PORT", "eighty")]).is_err());
    }
}

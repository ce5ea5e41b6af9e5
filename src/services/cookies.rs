use chrono::{DateTime, Utc};
use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::models::session::SessionPair;

/// Name of the cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Cross-site policy for the session cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSiteMode {
    Lax,
    None,
    Strict,
}

impl SameSiteMode {
    /// Parses `lax`, `none` or `strict`, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lax" => Some(Self::Lax),
            "none" => Some(Self::None),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    fn as_cookie_attr(self) -> SameSite {
        match self {
            Self::Lax => SameSite::Lax,
            Self::None => SameSite::None,
            Self::Strict => SameSite::Strict,
        }
    }
}

/// Attributes applied to both session cookies.
///
/// Browsers drop `SameSite=None` cookies that are not `Secure`, so
/// [`CookiePolicy::new`] always turns `secure` on for that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    same_site: SameSiteMode,
    secure: bool,
}

impl CookiePolicy {
    /// Both session cookies, and their removals, are scoped to the whole site.
    pub const PATH: &'static str = "/";

    pub fn new(same_site: SameSiteMode, production: bool) -> Self {
        Self {
            same_site,
            secure: same_site == SameSiteMode::None || production,
        }
    }

    pub fn same_site(&self) -> SameSiteMode {
        self.same_site
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Session cookies are never readable from scripts.
    pub fn http_only(&self) -> bool {
        true
    }

    /// Builds one session cookie whose `Max-Age` runs until `expires_at`.
    pub fn build(
        &self,
        name: &'static str,
        value: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(self.http_only())
            .secure(self.secure)
            .same_site(self.same_site.as_cookie_attr())
            .path(Self::PATH)
            .max_age(Duration::seconds(max_age_secs(expires_at, now)))
            .build()
    }
}

/// Whole seconds from `now` until `expires_at`, never negative.
pub fn max_age_secs(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

/// Writes both halves of `pair` to the response cookies.
pub fn apply(cookies: &Cookies, policy: &CookiePolicy, pair: &SessionPair, now: DateTime<Utc>) {
    cookies.add(policy.build(
        ACCESS_COOKIE,
        pair.access.token.clone(),
        pair.access.expires_at,
        now,
    ));
    cookies.add(policy.build(
        REFRESH_COOKIE,
        pair.refresh.token.clone(),
        pair.refresh.expires_at,
        now,
    ));
    tracing::debug!("🍪 Session cookies set");
}

/// Expires both session cookies.
///
/// The removal cookies carry fixed attributes rather than the configured
/// policy, so logout still clears cookies issued under a different mode.
pub fn clear(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        cookies.add(removal_cookie(name));
    }
    tracing::debug!("🍪 Session cookies cleared");
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path(CookiePolicy::PATH)
        .build();
    cookie.make_removal();
    cookie
}

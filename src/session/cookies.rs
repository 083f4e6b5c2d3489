//! Cookie store adapter for the access and refresh credentials.
//!
//! Wraps an `axum_extra` [`CookieJar`] for one request/response exchange. Reads
//! see writes made earlier in the same exchange, and repeated writes to the same
//! name collapse into a single `Set-Cookie` (last write wins).

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use super::credentials::CredentialPair;

const DEFAULT_ACCESS_COOKIE_NAME: &str = "access_token";
const DEFAULT_REFRESH_COOKIE_NAME: &str = "refresh_token";
const DEFAULT_ACCESS_MAX_AGE_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct CookieConfig {
    access_name: String,
    refresh_name: String,
    secure: bool,
    access_max_age_seconds: i64,
    refresh_max_age_seconds: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_name: DEFAULT_ACCESS_COOKIE_NAME.to_string(),
            refresh_name: DEFAULT_REFRESH_COOKIE_NAME.to_string(),
            secure: false,
            access_max_age_seconds: DEFAULT_ACCESS_MAX_AGE_SECONDS,
            refresh_max_age_seconds: DEFAULT_REFRESH_MAX_AGE_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_name(mut self, name: String) -> Self {
        self.access_name = name;
        self
    }

    #[must_use]
    pub fn with_refresh_name(mut self, name: String) -> Self {
        self.refresh_name = name;
        self
    }

    /// Mark cookies `Secure`; enabled for production deployments.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `0` leaves the cookie without `Max-Age` (session cookie).
    #[must_use]
    pub fn with_access_max_age_seconds(mut self, seconds: i64) -> Self {
        self.access_max_age_seconds = seconds;
        self
    }

    /// `0` leaves the cookie without `Max-Age` (session cookie).
    #[must_use]
    pub fn with_refresh_max_age_seconds(mut self, seconds: i64) -> Self {
        self.refresh_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn access_name(&self) -> &str {
        &self.access_name
    }

    #[must_use]
    pub fn refresh_name(&self) -> &str {
        &self.refresh_name
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    fn max_age_for(&self, name: &str) -> i64 {
        if name == self.access_name {
            self.access_max_age_seconds
        } else if name == self.refresh_name {
            self.refresh_max_age_seconds
        } else {
            0
        }
    }
}

/// Per-exchange view over the request cookies and pending response cookies.
#[derive(Debug)]
pub struct CookieStore {
    jar: CookieJar,
    config: Arc<CookieConfig>,
}

impl CookieStore {
    #[must_use]
    pub fn new(jar: CookieJar, config: Arc<CookieConfig>) -> Self {
        Self { jar, config }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_string())
    }

    /// Write a cookie with the transport attributes (`Path=/`, `HttpOnly`,
    /// `SameSite=Lax`, `Secure` in production) and the configured `Max-Age`.
    pub fn set(&mut self, name: &str, value: &str) {
        let mut cookie = self.base_cookie(name, value);
        let max_age = self.config.max_age_for(name);
        if max_age > 0 {
            cookie.set_max_age(time::Duration::seconds(max_age));
        }
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    pub fn delete(&mut self, name: &str) {
        let cookie = self.base_cookie(name, "");
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }

    /// Current access credential; `None` when absent.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.get(self.config.access_name()).map(SecretString::from)
    }

    /// Current refresh credential; an empty cookie counts as absent.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.get(self.config.refresh_name())
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    }

    /// Persist a pair. A pair without a refresh token keeps the current refresh cookie.
    pub fn persist(&mut self, pair: &CredentialPair) {
        let access_name = self.config.access_name().to_string();
        self.set(&access_name, pair.access_token().expose_secret());

        if let Some(refresh) = pair.refresh_token() {
            let refresh_name = self.config.refresh_name().to_string();
            self.set(&refresh_name, refresh.expose_secret());
        }
    }

    /// Remove both credentials.
    pub fn clear(&mut self) {
        let access_name = self.config.access_name().to_string();
        let refresh_name = self.config.refresh_name().to_string();
        self.delete(&access_name);
        self.delete(&refresh_name);
    }

    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn base_cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_string(), value.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.config.secure());
        cookie
    }
}

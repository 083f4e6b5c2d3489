//! Credential pair returned by the upstream and the key used to deduplicate refreshes.

use axum::http::{header::SET_COOKIE, HeaderMap};
use axum_extra::extract::cookie::Cookie;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::AuthError;

/// Access credential plus the (optionally rotated) refresh credential.
///
/// A pair is never mutated; a successful refresh produces a new one.
#[derive(Clone, Debug)]
pub struct CredentialPair {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl CredentialPair {
    /// Build a pair, rejecting an empty access token.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidResponse` if `access_token` is empty.
    pub fn new(access_token: String, refresh_token: Option<String>) -> Result<Self, AuthError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidResponse(
                "missing access_token".to_string(),
            ));
        }
        Ok(Self {
            access_token: SecretString::from(access_token),
            refresh_token: refresh_token
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
        })
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    /// Extract a pair from a successful upstream auth response.
    ///
    /// The access token comes from the JSON body. The refresh token comes from
    /// the body `refresh_token` field, or from a `Set-Cookie` header named
    /// `refresh_cookie_name` when the body does not carry one.
    pub(crate) async fn from_response(
        response: reqwest::Response,
        refresh_cookie_name: &str,
    ) -> Result<Self, AuthError> {
        let cookie_refresh = refresh_from_set_cookie(response.headers(), refresh_cookie_name);
        let bytes = response.bytes().await?;
        let body: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|err| AuthError::InvalidResponse(format!("token body: {err}")))?;

        let refresh_token = body.refresh_token.or(cookie_refresh);
        if refresh_token.is_none() {
            debug!("upstream did not rotate the refresh token");
        }

        Self::new(body.access_token, refresh_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn refresh_from_set_cookie(headers: &HeaderMap, refresh_cookie_name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .find(|cookie| cookie.name() == refresh_cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// Deduplication key derived from the current refresh credential.
///
/// Only a SHA-256 digest of the credential is kept so raw refresh tokens never
/// sit in the ticket table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// No refresh cookie was presented.
    Anonymous,
    Refresh([u8; 32]),
}

impl SessionKey {
    #[must_use]
    pub fn from_refresh_token(refresh_token: Option<&SecretString>) -> Self {
        match refresh_token {
            Some(token) => {
                let digest = Sha256::digest(token.expose_secret().as_bytes());
                let mut key = [0u8; 32];
                key.copy_from_slice(&digest);
                Self::Refresh(key)
            }
            None => Self::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn new_rejects_empty_access_token() {
        assert!(matches!(
            CredentialPair::new(String::new(), Some("r1".to_string())),
            Err(AuthError::InvalidResponse(_))
        ));
    }

    #[test]
    fn new_drops_empty_refresh_token() -> Result<(), AuthError> {
        let pair = CredentialPair::new("a1".to_string(), Some(String::new()))?;
        assert_eq!(pair.access_token().expose_secret(), "a1");
        assert!(pair.refresh_token().is_none());
        Ok(())
    }

    #[test]
    fn session_key_is_stable_per_token() {
        let first = SecretString::from("r1".to_string());
        let same = SecretString::from("r1".to_string());
        let other = SecretString::from("r2".to_string());

        assert_eq!(
            SessionKey::from_refresh_token(Some(&first)),
            SessionKey::from_refresh_token(Some(&same))
        );
        assert_ne!(
            SessionKey::from_refresh_token(Some(&first)),
            SessionKey::from_refresh_token(Some(&other))
        );
        assert_eq!(SessionKey::from_refresh_token(None), SessionKey::Anonymous);
    }

    #[test]
    fn refresh_from_set_cookie_matches_name() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("other=x; Path=/; HttpOnly"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refresh_token=r2; Path=/; HttpOnly; SameSite=Lax"),
        );

        assert_eq!(
            refresh_from_set_cookie(&headers, "refresh_token"),
            Some("r2".to_string())
        );
        assert_eq!(refresh_from_set_cookie(&headers, "missing"), None);
    }

    #[test]
    fn refresh_from_set_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("refresh_token=; Path=/; Max-Age=0"),
        );
        assert_eq!(refresh_from_set_cookie(&headers, "refresh_token"), None);
    }
}

//! HTTP client for the upstream identity API.
//!
//! Upstream contract:
//! - `POST /auth/refresh` with `{"refresh_token": "..."}`; any non-2xx means the
//!   refresh credential is no longer valid.
//! - `POST /auth/register` with the JSON registration payload; `401` means the
//!   registration was rejected, other `4xx` answers carry validation failures.
//! - Any other path accepts `Authorization: Bearer <access>` and answers `401`
//!   when the access token has expired.

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{
    header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info_span, instrument, Instrument};
use url::Url;

use super::{
    coordinator::{RefreshOutcome, TokenRefresher},
    credentials::CredentialPair,
    error::AuthError,
};
use crate::APP_USER_AGENT;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// A call to forward to the upstream on behalf of the browser.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    path: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Value>,
}

impl UpstreamRequest {
    /// `GET` request for `path` (including any query string).
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Send `body` as JSON.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    refresh_cookie_name: String,
}

impl UpstreamClient {
    /// Build a client for `base_url` using the default request timeout.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute `http(s)` URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, refresh_cookie_name: &str) -> Result<Self> {
        Self::with_timeout(
            base_url,
            refresh_cookie_name,
            Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    /// # Errors
    /// Returns an error if the URL is not an absolute `http(s)` URL or the HTTP
    /// client cannot be built.
    pub fn with_timeout(base_url: &str, refresh_cookie_name: &str, timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("Invalid upstream URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported upstream URL scheme: {}", parsed.scheme());
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_cookie_name: refresh_cookie_name.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Issue `request` once, attaching `access_token` as a bearer credential
    /// when it is present and non-empty.
    ///
    /// # Errors
    /// Returns an error only for transport failures; every HTTP status is
    /// returned as a response.
    pub async fn send(
        &self,
        request: &UpstreamRequest,
        access_token: Option<&SecretString>,
    ) -> Result<Response, AuthError> {
        let url = self.endpoint(&request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if let Some(token) = access_token.filter(|token| !token.expose_secret().is_empty()) {
            builder = builder.header(
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }

        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let span = info_span!(
            "upstream.request",
            http.method = %request.method,
            url = %url
        );
        let response = builder.send().instrument(span).await?;
        debug!("upstream {} {} -> {}", request.method, request.path, response.status());

        Ok(response)
    }

    /// Exchange a refresh credential for a new pair.
    ///
    /// # Errors
    /// - `Unauthenticated` when `refresh_token` is `None` (no call is made).
    /// - `SessionExpired` when the upstream answers with a non-success status.
    /// - Transport and decoding failures otherwise.
    #[instrument(skip(self, refresh_token))]
    pub async fn perform_refresh(
        &self,
        refresh_token: Option<SecretString>,
    ) -> Result<CredentialPair, AuthError> {
        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::Unauthenticated);
        };

        let response = self
            .http
            .post(self.endpoint("/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token.expose_secret() }))
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("refresh rejected: {}", response.status());
            return Err(AuthError::SessionExpired);
        }

        CredentialPair::from_response(response, &self.refresh_cookie_name).await
    }

    /// Post a registration payload and return the initial pair.
    ///
    /// # Errors
    /// - `RegistrationFailed` when the upstream answers `401`.
    /// - `RegistrationRejected` for any other `4xx`.
    /// - `UpstreamStatus` for any other non-success status.
    /// - Transport and decoding failures otherwise.
    #[instrument(skip(self, payload))]
    pub async fn register<T: Serialize + Sync>(
        &self,
        payload: &T,
    ) -> Result<CredentialPair, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/auth/register"))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::RegistrationFailed);
        }
        if status.is_client_error() {
            debug!("registration rejected: {status}");
            return Err(AuthError::RegistrationRejected(status));
        }
        if !status.is_success() {
            return Err(AuthError::UpstreamStatus(status));
        }

        CredentialPair::from_response(response, &self.refresh_cookie_name).await
    }
}

impl TokenRefresher for UpstreamClient {
    fn refresh(&self, refresh_token: Option<SecretString>) -> BoxFuture<'static, RefreshOutcome> {
        let client = self.clone();
        async move { client.perform_refresh(refresh_token).await }.boxed()
    }
}

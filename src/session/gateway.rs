//! Authenticated upstream calls with a single transparent retry after refresh.

use axum_extra::extract::cookie::CookieJar;
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    cookies::{CookieConfig, CookieStore},
    coordinator::RefreshCoordinator,
    error::AuthError,
    register::{self, RegisterForm},
    upstream::{UpstreamClient, UpstreamRequest},
};

/// Entry point used by the HTTP handlers.
#[derive(Clone, Debug)]
pub struct Gateway {
    upstream: UpstreamClient,
    coordinator: Arc<RefreshCoordinator>,
    cookie_config: Arc<CookieConfig>,
}

impl Gateway {
    #[must_use]
    pub fn new(
        upstream: UpstreamClient,
        coordinator: Arc<RefreshCoordinator>,
        cookie_config: CookieConfig,
    ) -> Self {
        Self {
            upstream,
            coordinator,
            cookie_config: Arc::new(cookie_config),
        }
    }

    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Open the cookie store for one request/response exchange.
    #[must_use]
    pub fn cookie_store(&self, jar: CookieJar) -> CookieStore {
        CookieStore::new(jar, Arc::clone(&self.cookie_config))
    }

    /// Forward `request` with the access cookie as bearer credential.
    ///
    /// A `401` triggers (or joins) a refresh and exactly one retry with the new
    /// token; whatever the retry returns is handed back unchanged. At most two
    /// upstream requests are made per call.
    ///
    /// # Errors
    /// Returns the refresh failure when the refresh is rejected (no retry is
    /// made), or a transport failure from either attempt.
    #[instrument(skip(self, cookies, request), fields(method = %request.method(), path = request.path()))]
    pub async fn authenticated_call(
        &self,
        cookies: &mut CookieStore,
        request: &UpstreamRequest,
    ) -> Result<Response, AuthError> {
        let access_token = cookies.access_token();
        let response = self.upstream.send(request, access_token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("access token rejected, refreshing");
        let fresh = self.coordinator.get_fresh_access_token(cookies).await?;

        self.upstream.send(request, Some(&fresh)).await
    }

    /// Run the registration flow against the upstream.
    ///
    /// # Errors
    /// See [`register::register`].
    pub async fn register(
        &self,
        cookies: &mut CookieStore,
        form: RegisterForm,
    ) -> Result<(), AuthError> {
        register::register(&self.upstream, cookies, form).await
    }
}

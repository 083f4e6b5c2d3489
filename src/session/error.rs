//! Failure taxonomy for the session edge.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the refresh, proxy and registration paths.
///
/// `Clone` because a single refresh outcome is handed to every request that
/// joined the same ticket.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Session expired")]
    SessionExpired,
    #[error("Registration failed")]
    RegistrationFailed,
    /// The upstream refused the registration payload with a client error.
    #[error("Registration failed")]
    RegistrationRejected(StatusCode),
    #[error("upstream request timed out")]
    UpstreamTimeout,
    #[error("upstream request failed: {0}")]
    Upstream(#[source] Arc<reqwest::Error>),
    #[error("upstream responded with {0}")]
    UpstreamStatus(StatusCode),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
    #[error("refresh task aborted: {0}")]
    RefreshAborted(String),
}

impl AuthError {
    /// Status returned to the browser for this condition.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::SessionExpired | Self::RegistrationFailed => {
                StatusCode::UNAUTHORIZED
            }
            Self::RegistrationRejected(status) => *status,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_)
            | Self::UpstreamStatus(_)
            | Self::InvalidResponse(_)
            | Self::RefreshAborted(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout
        } else {
            Self::Upstream(Arc::new(err))
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthenticated
            | Self::SessionExpired
            | Self::RegistrationFailed
            | Self::RegistrationRejected(_) => (status, self.to_string()).into_response(),
            Self::UpstreamTimeout => (status, "Upstream timed out").into_response(),
            other => {
                error!("Upstream failure: {other}");
                (status, "Upstream unavailable").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_conditions_map_to_unauthorized() {
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::SessionExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::RegistrationFailed.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn upstream_failures_map_to_gateway_errors() {
        assert_eq!(
            AuthError::UpstreamTimeout.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AuthError::UpstreamStatus(StatusCode::INTERNAL_SERVER_ERROR).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::InvalidResponse("missing access_token".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn response_does_not_leak_internal_detail() -> anyhow::Result<()> {
        let response =
            AuthError::InvalidResponse("secret internal detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"Upstream unavailable");
        Ok(())
    }

    #[tokio::test]
    async fn registration_rejection_keeps_client_status() -> anyhow::Result<()> {
        let response =
            AuthError::RegistrationRejected(StatusCode::UNPROCESSABLE_ENTITY).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"Registration failed");
        Ok(())
    }

    #[test]
    fn session_expired_message() {
        assert_eq!(AuthError::SessionExpired.to_string(), "Session expired");
        assert_eq!(AuthError::Unauthenticated.to_string(), "Not authenticated");
    }
}

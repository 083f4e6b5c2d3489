//! Registration flow: form submission in, initial credential pair out.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{cookies::CookieStore, error::AuthError, upstream::UpstreamClient};

/// Browser form fields. Missing fields are forwarded as empty strings; field
/// validation is the upstream's job.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    /// Checkbox value; only `"on"` counts as checked.
    pub remember: Option<String>,
}

/// JSON body sent to `POST /auth/register`.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    pub remember: bool,
}

impl From<RegisterForm> for RegisterRequest {
    fn from(form: RegisterForm) -> Self {
        Self {
            email: form.email.unwrap_or_default(),
            display_name: form.display_name.unwrap_or_default(),
            name: form.name.unwrap_or_default(),
            password: form.password.unwrap_or_default(),
            confirm_password: form.confirm_password.unwrap_or_default(),
            remember: form.remember.as_deref() == Some("on"),
        }
    }
}

/// Register upstream and persist the returned pair.
///
/// Cookies are only touched on success.
///
/// # Errors
/// Returns `RegistrationFailed` when the upstream answers `401`, or the
/// transport/response failure otherwise.
#[instrument(skip(upstream, cookies, form))]
pub async fn register(
    upstream: &UpstreamClient,
    cookies: &mut CookieStore,
    form: RegisterForm,
) -> Result<(), AuthError> {
    let request = RegisterRequest::from(form);
    debug!("registering {}", request.email);

    let pair = upstream.register(&request).await?;
    cookies.persist(&pair);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CookieConfig;
    use anyhow::Result;
    use axum_extra::extract::cookie::CookieJar;
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn full_form(remember: &str) -> RegisterForm {
        RegisterForm {
            email: Some("ana@example.com".to_string()),
            display_name: Some("ana".to_string()),
            name: Some("Ana Lima".to_string()),
            password: Some("hunter22".to_string()),
            confirm_password: Some("hunter22".to_string()),
            remember: Some(remember.to_string()),
        }
    }

    #[test]
    fn form_maps_to_request() {
        let request = RegisterRequest::from(full_form("on"));
        assert_eq!(
            request,
            RegisterRequest {
                email: "ana@example.com".to_string(),
                display_name: "ana".to_string(),
                name: "Ana Lima".to_string(),
                password: "hunter22".to_string(),
                confirm_password: "hunter22".to_string(),
                remember: true,
            }
        );
    }

    #[test]
    fn remember_requires_on() {
        assert!(!RegisterRequest::from(full_form("true")).remember);
        assert!(!RegisterRequest::from(full_form("")).remember);
        assert!(!RegisterRequest::from(RegisterForm::default()).remember);
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let request = RegisterRequest::from(RegisterForm {
            email: Some("ana@example.com".to_string()),
            ..RegisterForm::default()
        });
        assert_eq!(request.email, "ana@example.com");
        assert_eq!(request.display_name, "");
        assert_eq!(request.name, "");
        assert_eq!(request.password, "");
        assert_eq!(request.confirm_password, "");
    }

    #[test]
    fn password_mismatch_is_not_checked_locally() {
        let mut form = full_form("on");
        form.confirm_password = Some("different".to_string());
        let request = RegisterRequest::from(form);
        assert_eq!(request.confirm_password, "different");
    }

    #[tokio::test]
    async fn register_persists_initial_pair() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "email": "ana@example.com",
                "display_name": "ana",
                "name": "Ana Lima",
                "password": "hunter22",
                "confirm_password": "hunter22",
                "remember": true
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("set-cookie", "refresh_token=r1; Path=/; HttpOnly")
                    .set_body_json(json!({"access_token": "a1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let upstream = UpstreamClient::new(&server.uri(), "refresh_token")?;
        let mut cookies = CookieStore::new(CookieJar::default(), Arc::new(CookieConfig::new()));
        register(&upstream, &mut cookies, full_form("on")).await?;

        assert_eq!(cookies.get("access_token"), Some("a1".to_string()));
        assert_eq!(cookies.get("refresh_token"), Some("r1".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn register_unauthorized_sets_no_cookies() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = UpstreamClient::new(&server.uri(), "refresh_token")?;
        let mut cookies = CookieStore::new(CookieJar::default(), Arc::new(CookieConfig::new()));
        let result = register(&upstream, &mut cookies, full_form("on")).await;

        assert!(matches!(result, Err(AuthError::RegistrationFailed)));
        assert_eq!(cookies.into_jar().iter().count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn register_validation_failure_keeps_client_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let upstream = UpstreamClient::new(&server.uri(), "refresh_token")?;
        let mut cookies = CookieStore::new(CookieJar::default(), Arc::new(CookieConfig::new()));
        let result = register(&upstream, &mut cookies, full_form("")).await;

        assert!(
            matches!(result, Err(AuthError::RegistrationRejected(status)) if status.as_u16() == 422)
        );
        assert_eq!(cookies.into_jar().iter().count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn register_server_failure_is_upstream_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let upstream = UpstreamClient::new(&server.uri(), "refresh_token")?;
        let mut cookies = CookieStore::new(CookieJar::default(), Arc::new(CookieConfig::new()));
        let result = register(&upstream, &mut cookies, full_form("")).await;

        assert!(matches!(result, Err(AuthError::UpstreamStatus(status)) if status.as_u16() == 503));
        Ok(())
    }
}

use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use crate::session::{Gateway, RegisterForm};

#[utoipa::path(
    post,
    path= "/auth/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Registered; access and refresh cookies set", body = String),
        (status = 401, description = "Registration failed"),
        (status = 422, description = "Registration rejected by the upstream"),
        (status = 502, description = "Upstream unavailable"),
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, jar, form))]
pub async fn register(
    gateway: Extension<Gateway>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> impl IntoResponse {
    let mut cookies = gateway.cookie_store(jar);

    match gateway.register(&mut cookies, form).await {
        Ok(()) => (cookies.into_jar(), (StatusCode::OK, Json("ok"))).into_response(),
        Err(err) => {
            warn!("Registration failed: {err}");
            (cookies.into_jar(), err).into_response()
        }
    }
}

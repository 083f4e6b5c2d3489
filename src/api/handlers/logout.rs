use axum::{extract::Extension, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;

use crate::session::Gateway;

#[utoipa::path(
    post,
    path= "/auth/logout",
    responses (
        (status = 204, description = "Credential cookies cleared"),
    ),
    tag= "auth"
)]
pub async fn logout(gateway: Extension<Gateway>, jar: CookieJar) -> impl IntoResponse {
    // Only cookies presented with the request produce a removal `Set-Cookie`.
    let mut cookies = gateway.cookie_store(jar);
    cookies.clear();
    (cookies.into_jar(), StatusCode::NO_CONTENT)
}

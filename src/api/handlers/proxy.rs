//! Generic authenticated pass-through to the upstream API.

use axum::{
    body::Bytes,
    extract::Extension,
    http::{
        header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE},
        HeaderMap, HeaderName, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::session::{AuthError, Gateway, UpstreamRequest};

const PROXY_PREFIX: &str = "/api";

/// Browser headers forwarded to the upstream; everything else (cookies,
/// authorization, host) stays at the edge.
static FORWARDED_HEADERS: [HeaderName; 3] = [
    ACCEPT,
    ACCEPT_LANGUAGE,
    HeaderName::from_static("x-request-id"),
];

/// The path is taken from the raw request URI, so percent-encoded bytes reach
/// the upstream as the browser sent them.
#[instrument(skip(gateway, headers, jar, body))]
pub async fn proxy(
    gateway: Extension<Gateway>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    let Some(path) = upstream_path(&uri) else {
        debug!("rejecting path {}", uri.path());
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };

    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("rejecting non-JSON body: {err}");
                return (StatusCode::BAD_REQUEST, "Request body must be JSON").into_response();
            }
        }
    };

    let mut request = UpstreamRequest::new(path)
        .with_method(method)
        .with_headers(forwarded_headers(&headers));
    if let Some(body) = body {
        request = request.with_body(body);
    }

    let mut cookies = gateway.cookie_store(jar);
    let result = match gateway.authenticated_call(&mut cookies, &request).await {
        Ok(response) => relay(response).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => (cookies.into_jar(), response).into_response(),
        Err(err) => (cookies.into_jar(), err).into_response(),
    }
}

/// Upstream path and query for a proxied URI, still percent-encoded.
///
/// Returns `None` outside the proxy prefix or when a segment is a dot segment,
/// encoded or not, since URL normalisation would resolve it upstream.
fn upstream_path(uri: &Uri) -> Option<String> {
    let path = uri.path().strip_prefix(PROXY_PREFIX)?;
    if !path.starts_with('/') {
        return None;
    }

    let dot_segment = path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    });
    if dot_segment {
        return None;
    }

    Some(match uri.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    })
}

fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for name in &FORWARDED_HEADERS {
        for value in headers.get_all(name) {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

/// Copy status, content type and body of the upstream response.
async fn relay(response: reqwest::Response) -> Result<Response, AuthError> {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let body = response.bytes().await?;

    let mut relayed = (status, body).into_response();
    match content_type {
        Some(value) => {
            relayed.headers_mut().insert(CONTENT_TYPE, value);
        }
        None => {
            relayed.headers_mut().remove(CONTENT_TYPE);
        }
    }
    Ok(relayed)
}

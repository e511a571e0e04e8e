//! HTTP Basic authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

use crate::config::AuthConfig;

const REALM_CHALLENGE: &str = "Basic realm=\"pgbouncer-conf-api\"";

/// Expected credentials, shared across requests.
#[derive(Clone)]
pub struct BasicAuth {
    inner: Arc<AuthConfig>,
}

impl BasicAuth {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            inner: Arc::new(config.clone()),
        }
    }

    /// Check an `Authorization` header value.
    pub fn accepts(&self, header_value: &str) -> bool {
        let Some(encoded) = header_value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        match decoded.split_once(':') {
            Some((user, pass)) => user == self.inner.username && pass == self.inner.password,
            None => false,
        }
    }
}

pub async fn basic_auth_middleware(
    State(auth): State<BasicAuth>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| auth.accepts(v));

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated request");
    let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(REALM_CHALLENGE),
    );
    response
}

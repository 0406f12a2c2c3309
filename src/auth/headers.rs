//! Token transport headers.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

/// Header carrying the access token, on requests and on login/refresh responses.
pub const ACCESS_TOKEN_HEADER: HeaderName = header::AUTHORIZATION;

/// Header carrying the refresh token.
pub const REFRESH_TOKEN_HEADER: HeaderName = HeaderName::from_static("authorization-refresh");

const BEARER: &str = "bearer ";

fn strip_bearer(value: &str) -> Option<&str> {
    let value = value.trim();
    let prefix = value.get(..BEARER.len())?;
    if prefix.eq_ignore_ascii_case(BEARER) {
        Some(value[BEARER.len()..].trim())
    } else {
        None
    }
}

/// Access token from `Authorization: Bearer <token>`. Other schemes count as absent.
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(ACCESS_TOKEN_HEADER)?.to_str().ok()?;
    strip_bearer(value).filter(|token| !token.is_empty())
}

/// Refresh token from `Authorization-Refresh`, with or without the `Bearer ` prefix.
pub fn refresh_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(REFRESH_TOKEN_HEADER)?.to_str().ok()?;
    let token = strip_bearer(value).unwrap_or(value.trim());
    (!token.is_empty()).then_some(token)
}

/// `Bearer <token>` header value.
pub fn bearer_value(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token)).ok()
}

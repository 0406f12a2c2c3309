//! Login filter: answers `POST /login` itself and never calls the rest of the pipeline.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::credentials::authenticate;
use super::errors::{AuthError, AuthErrorKind};
use super::issuer::{LoginTokens, TokenIssuer};
use super::state::AuthState;

pub const LOGIN_PATH: &str = "/login";

/// Login bodies larger than this are rejected as malformed.
const MAX_LOGIN_BODY_BYTES: usize = 16 * 1024;

/// Longest accepted email (RFC 5321 path limit).
const MAX_IDENTIFIER_BYTES: usize = 254;

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Middleware for the login endpoint.
pub async fn login_filter(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    if request.method() != Method::POST || request.uri().path() != LOGIN_PATH {
        return next.run(request).await;
    }

    match attempt_login(&state, request).await {
        Ok(tokens) => tokens.into_response(),
        Err(e) => {
            tracing::debug!(kind = ?e.kind, "Login rejected");
            e.into_response()
        }
    }
}

async fn attempt_login(state: &AuthState, request: Request) -> Result<LoginTokens, AuthError> {
    if !is_json(request.headers()) {
        return Err(AuthErrorKind::UnsupportedContentType.into());
    }

    let client = client_ip(&request);

    let body = axum::body::to_bytes(request.into_body(), MAX_LOGIN_BODY_BYTES)
        .await
        .map_err(|_| AuthError::new(AuthErrorKind::MalformedRequest))?;
    let credentials: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        AuthError::with_message(
            AuthErrorKind::MalformedRequest,
            format!("Request body is invalid: {}", e),
        )
    })?;

    if credentials.email.len() > MAX_IDENTIFIER_BYTES {
        return Err(AuthError::with_message(
            AuthErrorKind::MalformedRequest,
            "Email is too long",
        ));
    }

    if !state.login_limiter.check(&credentials.email, client) {
        return Err(AuthErrorKind::TooManyAttempts.into());
    }

    let principal = authenticate(
        &state.db,
        state.comparator.clone(),
        &credentials.email,
        &credentials.password,
    )
    .await?;

    TokenIssuer::new(&state.db, &state.codec, state.ttls)
        .issue_login_tokens(&principal)
        .await
}

/// Peer address, present when served with connect info.
fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// `application/json`, optionally with parameters such as `charset`.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

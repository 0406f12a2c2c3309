//! Authentication error taxonomy and the uniform JSON error envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

/// Every way authentication or authorization can fail.
/// Serialized by variant name into the envelope's `errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthErrorKind {
    MissingToken,
    MalformedToken,
    ExpiredToken,
    InvalidSignature,
    UnknownPrincipal,
    Unauthenticated,
    DisabledAccount,
    BadSecret,
    Forbidden,
    UnsupportedContentType,
    MalformedRequest,
    TooManyAttempts,
    Internal,
}

impl AuthErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthErrorKind::MissingToken
            | AuthErrorKind::MalformedToken
            | AuthErrorKind::ExpiredToken
            | AuthErrorKind::InvalidSignature
            | AuthErrorKind::UnknownPrincipal
            | AuthErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthErrorKind::DisabledAccount | AuthErrorKind::Forbidden => StatusCode::FORBIDDEN,
            AuthErrorKind::BadSecret
            | AuthErrorKind::UnsupportedContentType
            | AuthErrorKind::MalformedRequest => StatusCode::BAD_REQUEST,
            AuthErrorKind::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            AuthErrorKind::MissingToken => "Token is missing",
            AuthErrorKind::MalformedToken => "Token is malformed",
            AuthErrorKind::ExpiredToken => "Token has expired",
            AuthErrorKind::InvalidSignature => "Token signature is invalid",
            AuthErrorKind::UnknownPrincipal => "User not found",
            AuthErrorKind::Unauthenticated => "Not authenticated",
            AuthErrorKind::DisabledAccount => "Account is disabled",
            AuthErrorKind::BadSecret => "Invalid email or password",
            AuthErrorKind::Forbidden => "Insufficient permissions",
            AuthErrorKind::UnsupportedContentType => "Content type must be application/json",
            AuthErrorKind::MalformedRequest => "Request body is invalid",
            AuthErrorKind::TooManyAttempts => "Too many login attempts. Please wait before trying again",
            AuthErrorKind::Internal => "Internal server error",
        }
    }
}

impl From<TokenError> for AuthErrorKind {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed => AuthErrorKind::MalformedToken,
            TokenError::InvalidSignature => AuthErrorKind::InvalidSignature,
            TokenError::Expired => AuthErrorKind::ExpiredToken,
        }
    }
}

/// A taxonomy error with its message. Rendering it writes the error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
        }
    }

    pub fn with_message(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        Self::new(e.into())
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AuthError {}

/// `{ "errorCode": ..., "message": ... }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope<C: Serialize> {
    pub error_code: C,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.kind.status_code(),
            Json(ErrorEnvelope {
                error_code: self.kind,
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthErrorKind::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthErrorKind::ExpiredToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthErrorKind::DisabledAccount.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthErrorKind::BadSecret.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthErrorKind::UnsupportedContentType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthErrorKind::MalformedRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(
            AuthErrorKind::from(TokenError::Malformed),
            AuthErrorKind::MalformedToken
        );
        assert_eq!(
            AuthErrorKind::from(TokenError::InvalidSignature),
            AuthErrorKind::InvalidSignature
        );
        assert_eq!(
            AuthErrorKind::from(TokenError::Expired),
            AuthErrorKind::ExpiredToken
        );
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = AuthError::new(AuthErrorKind::ExpiredToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["errorCode"], "ExpiredToken");
        assert_eq!(json["message"], "Token has expired");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}

//! Turns an authentication rejection into the final response.

use axum::response::{IntoResponse, Response};

use super::context::RequestContext;
use super::errors::{AuthError, AuthErrorKind};

/// Render the failure recorded upstream, or a generic `Unauthenticated` when nothing more
/// specific is known (for example, no token was sent at all).
pub fn commence(ctx: Option<&RequestContext>) -> Response {
    match ctx.and_then(RequestContext::failure) {
        Some(failure) => failure.clone().into_response(),
        None => AuthError::new(AuthErrorKind::Unauthenticated).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn error_code(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["errorCode"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_generic_unauthenticated() {
        let response = commence(None);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "Unauthenticated");

        let response = commence(Some(&RequestContext::default()));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "Unauthenticated");
    }

    #[tokio::test]
    async fn test_attached_failure_is_rendered() {
        let mut ctx = RequestContext::default();
        ctx.attach_failure(AuthError::new(AuthErrorKind::DisabledAccount));

        let response = commence(Some(&ctx));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(response).await, "DisabledAccount");
    }
}

//! Axum extractors for handlers behind the auth pipeline.

use axum::{extract::FromRequestParts, http::request::Parts, response::Response};

use super::context::{RequestContext, SecurityContext};
use super::entry_point;

/// The caller's security context. Rejects through the entry point when the request was
/// not authenticated, which only happens if a handler is mounted on a public path.
pub struct Authenticated(pub SecurityContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        ctx.and_then(RequestContext::security)
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| entry_point::commence(ctx))
    }
}

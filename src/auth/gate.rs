//! Path-based authorization gate.
//!
//! Rules are checked in order and the first match wins. Only role membership is
//! checked here; anything finer belongs to the resource handlers.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::Role;

use super::context::RequestContext;
use super::entry_point;
use super::errors::{AuthError, AuthErrorKind};
use super::login::LOGIN_PATH;

/// Paths reachable without a security context.
pub const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, "/health"];

/// Path prefix reserved for administrators.
pub const ADMIN_PREFIX: &str = "/admin";

/// What a path requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

pub fn required_access(path: &str) -> Access {
    if PUBLIC_PATHS.contains(&path) {
        return Access::Public;
    }

    let under_admin = path
        .strip_prefix(ADMIN_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if under_admin {
        return Access::Role(Role::Admin);
    }

    Access::Authenticated
}

/// Middleware enforcing `required_access` for every request.
pub async fn authorization_gate(request: Request, next: Next) -> Response {
    let access = required_access(request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    let ctx = request.extensions().get::<RequestContext>();
    let Some(security) = ctx.and_then(RequestContext::security) else {
        return entry_point::commence(ctx);
    };

    if let Access::Role(role) = access {
        if !security.has_role(role) {
            tracing::debug!(
                subject = %security.identifier,
                role = role.as_str(),
                "Missing required role"
            );
            return AuthError::new(AuthErrorKind::Forbidden).into_response();
        }
    }

    next.run(request).await
}

//! Per-request token filter.
//!
//! On the refresh endpoint a valid refresh token is exchanged for a new access token and
//! the response is written here. Everywhere else the access token, if any, populates the
//! security context. This filter never rejects a request itself: a missing or bad token
//! leaves the context empty (with the cause attached) and the authorization gate decides.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::Principal;
use crate::jwt::{TokenCodec, TokenKind};

use super::context::{AuthOutcome, RequestContext, SecurityContext};
use super::directory::UserDirectory;
use super::errors::{AuthError, AuthErrorKind};
use super::headers;
use super::issuer::TokenIssuer;
use super::state::AuthState;

pub const REFRESH_PATH: &str = "/refresh";

/// Middleware running on every request.
pub async fn request_auth_filter(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = request
        .extensions_mut()
        .remove::<RequestContext>()
        .unwrap_or_default();

    if request.method() == Method::POST && request.uri().path() == REFRESH_PATH {
        if let Some(principal) =
            authenticate_refresh(&state.db, &state.codec, request.headers(), &mut ctx).await
        {
            return match TokenIssuer::new(&state.db, &state.codec, state.ttls)
                .reissue_access_token(&principal)
            {
                Ok(grant) => grant.into_response(),
                Err(e) => e.into_response(),
            };
        }
    } else {
        authenticate_access(&state.db, &state.codec, request.headers(), &mut ctx).await;
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Access path: populate the context from `Authorization: Bearer`.
pub async fn authenticate_access<D: UserDirectory>(
    directory: &D,
    codec: &TokenCodec,
    headers: &HeaderMap,
    ctx: &mut RequestContext,
) -> AuthOutcome {
    let Some(token) = headers::access_token(headers) else {
        return AuthOutcome::ContextEmpty;
    };

    let claims = match codec.parse_kind(token, TokenKind::Access) {
        Ok(claims) => claims,
        Err(e) => return reject(ctx, e.into()),
    };

    let principal = match directory.find_by_identifier(&claims.subject).await {
        Ok(Some(principal)) => principal,
        Ok(None) => return reject(ctx, AuthErrorKind::UnknownPrincipal.into()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up token subject");
            return reject(ctx, AuthErrorKind::Internal.into());
        }
    };

    if !principal.active {
        return reject(ctx, AuthErrorKind::DisabledAccount.into());
    }

    ctx.authenticate(SecurityContext::from(&principal));
    ctx.outcome()
}

/// Refresh path: resolve the principal owning the presented refresh token.
/// Returns `None` with a failure attached when the token cannot be honoured.
pub async fn authenticate_refresh<D: UserDirectory>(
    directory: &D,
    codec: &TokenCodec,
    headers: &HeaderMap,
    ctx: &mut RequestContext,
) -> Option<Principal> {
    let Some(token) = headers::refresh_token(headers) else {
        reject(ctx, AuthErrorKind::MissingToken.into());
        return None;
    };

    if let Err(e) = codec.parse_kind(token, TokenKind::Refresh) {
        reject(ctx, e.into());
        return None;
    }

    let principal = match directory.find_by_refresh_token(token).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            reject(
                ctx,
                AuthError::with_message(
                    AuthErrorKind::UnknownPrincipal,
                    "Refresh token is not recognised",
                ),
            );
            return None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up refresh token");
            reject(ctx, AuthErrorKind::Internal.into());
            return None;
        }
    };

    if !principal.active {
        reject(ctx, AuthErrorKind::DisabledAccount.into());
        return None;
    }

    ctx.authenticate(SecurityContext::from(&principal));
    Some(principal)
}

fn reject(ctx: &mut RequestContext, failure: AuthError) -> AuthOutcome {
    tracing::debug!(kind = ?failure.kind, "Token rejected");
    ctx.attach_failure(failure);
    AuthOutcome::ContextEmpty
}

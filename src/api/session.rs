//! Session endpoints.
//!
//! - POST `/logout` - Revoke the caller's refresh token
//!
//! Login and refresh are answered by the auth middleware before routing.

use axum::{
    Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};

use super::error::{ApiError, ResultExt};
use crate::auth::{Authenticated, UserDirectory};
use crate::db::Database;

#[derive(Clone)]
pub struct SessionState {
    pub db: Database,
}

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/logout", post(logout))
        .with_state(state)
}

/// Clear the stored refresh token so it can no longer be exchanged. Access tokens already
/// issued stay valid until they expire.
async fn logout(
    State(state): State<SessionState>,
    Authenticated(security): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .store_refresh_token(&security.identifier, None)
        .await
        .db_err("Failed to revoke refresh token")?;

    tracing::debug!(subject = %security.identifier, "Refresh token revoked");
    Ok(StatusCode::NO_CONTENT)
}

use std::collections::BTreeSet;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use super::error::{ApiError, ResultExt};
use crate::auth::Authenticated;
use crate::db::{Database, Role};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
}

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(current_user))
        .with_state(state)
}

/// List all principals.
async fn list_users(State(state): State<UsersState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.db.users().list().await.db_err("Failed to list users")?;

    Ok(Json(users))
}

#[derive(Serialize)]
struct CurrentUserResponse {
    email: String,
    roles: BTreeSet<Role>,
}

/// The caller, as seen by the auth pipeline.
async fn current_user(Authenticated(security): Authenticated) -> impl IntoResponse {
    Json(CurrentUserResponse {
        email: security.identifier,
        roles: security.roles,
    })
}

mod admin;
mod error;
mod session;
mod users;

use axum::{Router, routing::get};

use crate::db::Database;

pub use error::{ApiError, ApiErrorCode, ResultExt};
pub use session::SessionState;
pub use users::UsersState;

/// Create the resource router. Authentication and authorization run as layers around it.
pub fn create_api_router(db: Database) -> Router {
    let users_state = users::UsersState { db: db.clone() };
    let session_state = session::SessionState { db };

    Router::new()
        .route("/health", get(health))
        .merge(admin::router())
        .merge(session::router(session_state))
        .nest("/api/users", users::router(users_state))
        .fallback(not_found)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

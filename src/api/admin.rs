//! Admin endpoints. The authorization gate only lets admins reach them.

use axum::{Json, Router, routing::get};

pub fn router() -> Router {
    Router::new().route("/admin", get(admin_home))
}

async fn admin_home() -> Json<&'static str> {
    Json("admin")
}

//! Tests for path-based authorization and the resource endpoints behind it.

mod common;

use axum::http::StatusCode;
use common::{TestApp, assert_error, body_json, body_string};
use tracker_auth::db::Role;

async fn app_with_users() -> TestApp {
    let app = TestApp::new().await;
    app.create_user("admin@admin.com", "admin", &[Role::User, Role::Admin], true)
        .await;
    app.create_user("user@example.com", "user", &[Role::User], true)
        .await;
    app
}

#[tokio::test]
async fn test_admin_reaches_admin_path() {
    let app = app_with_users().await;
    let (access, _) = app.login_tokens("admin@admin.com", "admin").await;

    let response = app.get("/admin", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_string(response).await, "\"admin\"");
}

#[tokio::test]
async fn test_user_forbidden_on_admin_path() {
    let app = app_with_users().await;
    let (access, _) = app.login_tokens("user@example.com", "user").await;

    let response = app.get("/admin", Some(&access)).await;
    assert_error(response, StatusCode::FORBIDDEN, "Forbidden").await;

    let response = app.get("/admin/settings", Some(&access)).await;
    assert_error(response, StatusCode::FORBIDDEN, "Forbidden").await;
}

#[tokio::test]
async fn test_anonymous_admin_path_is_unauthenticated() {
    let app = app_with_users().await;

    let response = app.get("/admin", None).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
}

#[tokio::test]
async fn test_admin_prefix_needs_path_boundary() {
    let app = app_with_users().await;
    let (access, _) = app.login_tokens("user@example.com", "user").await;

    // Not under /admin: authenticated users get through to the 404 fallback
    let response = app.get("/administrator", Some(&access)).await;
    assert_error(response, StatusCode::NOT_FOUND, "NotFound").await;
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_unknown_path_requires_authentication() {
    let app = app_with_users().await;

    let response = app.get("/api/issues", None).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;

    let (access, _) = app.login_tokens("user@example.com", "user").await;
    let response = app.get("/api/issues", Some(&access)).await;
    assert_error(response, StatusCode::NOT_FOUND, "NotFound").await;
}

#[tokio::test]
async fn test_list_users() {
    let app = app_with_users().await;
    let (access, _) = app.login_tokens("user@example.com", "user").await;

    let response = app.get("/api/users", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let users = body.as_array().expect("array of users");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()
        && u.get("password_hash").is_none()));
    assert!(users.iter().any(|u| u["email"] == "admin@admin.com"));
}

#[tokio::test]
async fn test_me_reports_roles() {
    let app = app_with_users().await;
    let (access, _) = app.login_tokens("admin@admin.com", "admin").await;

    let response = app.get("/api/users/me", Some(&access)).await;
    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@admin.com");
    assert_eq!(body["roles"], serde_json::json!(["user", "admin"]));
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::new().await;
    app.create_user("user@example.com", "user", &[Role::User], true)
        .await;
    let (access, _) = app.login_tokens("user@example.com", "user").await;

    sqlx::query("UPDATE users SET roles = 'user,admin' WHERE email = ?")
        .bind("user@example.com")
        .execute(app.db.pool())
        .await
        .unwrap();

    // Roles are read from the directory on every request, not from the token
    let response = app.get("/admin", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

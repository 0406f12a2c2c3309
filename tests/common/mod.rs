#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use tracker_auth::{
    ServerConfig,
    auth::TokenTtls,
    create_app,
    db::{Database, Role},
    jwt::TokenCodec,
};

pub const JWT_SECRET: &[u8] = b"integration-test-secret-32-bytes-or-more";

/// bcrypt cost for test fixtures. Production hashes use the default cost.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub codec: TokenCodec,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TokenTtls::default(), 10).await
    }

    pub async fn with_options(ttls: TokenTtls, login_attempts_per_minute: u32) -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: JWT_SECRET.to_vec(),
            ttls,
            login_attempts_per_minute,
        };
        Self {
            app: create_app(&config),
            db,
            codec: TokenCodec::new(JWT_SECRET),
        }
    }

    /// Create an account with the given password.
    pub async fn create_user(&self, email: &str, password: &str, roles: &[Role], active: bool) {
        let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        self.db
            .users()
            .create(email, &hash, roles, active)
            .await
            .unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.send(login_request(email, password)).await
    }

    /// Log in and return (access, refresh) tokens without the `Bearer ` prefix.
    pub async fn login_tokens(&self, email: &str, password: &str) -> (String, String) {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        (
            bearer_header(&response, "authorization").expect("access token header"),
            bearer_header(&response, "authorization-refresh").expect("refresh token header"),
        )
    }

    pub async fn get(&self, uri: &str, access: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = access {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn refresh(&self, refresh: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .header("authorization-refresh", format!("Bearer {}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn login_request(email: &str, password: &str) -> Request<Body> {
    let body = serde_json::json!({ "email": email, "password": password });
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a `Bearer <token>` response header, returning the token.
pub fn bearer_header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Assert a failure envelope with the given status and error code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["errorCode"], code, "unexpected envelope: {}", body);
    assert!(body["message"].is_string());
}

pub fn short_ttls(access: Duration, refresh: Duration) -> TokenTtls {
    TokenTtls { access, refresh }
}

pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::{AuthState, TokenTtls, authorization_gate, login_filter, request_auth_filter};
use axum::{Router, middleware};
use db::Database;
use jwt::TokenCodec;
use rate_limit::LoginRateLimiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Shared secret for signing and verifying tokens
    pub jwt_secret: Vec<u8>,
    /// Access and refresh token lifetimes
    pub ttls: TokenTtls,
    /// Login attempts allowed per identifier per minute
    pub login_attempts_per_minute: u32,
}

/// Create the application router with the given configuration.
///
/// Requests pass through login, token filter, then authorization gate before routing.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
    let limiter = Arc::new(LoginRateLimiter::per_minute(
        config.login_attempts_per_minute,
    ));
    let state = AuthState::new(config.db.clone(), codec, config.ttls, limiter);

    create_api_router(config.db.clone()).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(state.clone(), login_filter))
            .layer(middleware::from_fn_with_state(state, request_auth_filter))
            .layer(middleware::from_fn(authorization_gate)),
    )
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database, jwt_secret: &[u8]) {
    let codec = Arc::new(TokenCodec::new(jwt_secret));
    cleanup::run_cleanup(db, &codec).await;
    cleanup::spawn_cleanup_scheduler(db.clone(), codec);
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    init_cleanup(&config.db, &config.jwt_secret).await;

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}

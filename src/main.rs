use std::net::SocketAddr;

use clap::Parser;
use tracing::{error, info};
use tracker_auth::cli::{
    Args, build_config, handle_create_admin, init_logging, load_jwt_secret, open_database,
};
use tracker_auth::{create_app, init_cleanup};

fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    // Read before the runtime spawns worker threads, so removing the env var is sound
    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to start runtime");
            std::process::exit(1);
        });

    runtime.block_on(serve(args, jwt_secret));
}

async fn serve(args: Args, jwt_secret: String) {
    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(email) = args.create_admin.as_deref() {
        handle_create_admin(&db, email).await;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let config = build_config(
        db,
        jwt_secret,
        args.access_token_ttl,
        args.refresh_token_ttl,
        args.login_attempts_per_minute,
    );
    init_cleanup(&config.db, &config.jwt_secret).await;
    let app = create_app(&config);

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(_) => info!(address = %addr, "Listening"),
    }

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, make_service).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

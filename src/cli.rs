//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use crate::ServerConfig;
use crate::auth::{BcryptComparator, TokenTtls};
use crate::db::{Database, Role};
use crate::rate_limit::DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64};
use clap::Parser;
use rand::RngCore;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for token lifetimes (ten years).
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tracker-auth",
    about = "Stateless token authentication for the issue tracker API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tracker.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value = "1800", value_parser = parse_ttl)]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value = "1209600", value_parser = parse_ttl)]
    pub refresh_token_ttl: Duration,

    /// Login attempts allowed per email per minute
    #[arg(long, default_value_t = DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE)]
    pub login_attempts_per_minute: u32,

    /// Create an admin with this email on startup and print its generated password
    #[arg(long, value_name = "EMAIL")]
    pub create_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn parse_ttl(s: &str) -> Result<Duration, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("TTL must be a whole number of seconds: {}", s))?;
    if secs == 0 {
        return Err("TTL must be greater than zero".to_string());
    }
    if secs > MAX_TTL_SECS {
        return Err(format!("TTL must be at most {} seconds", MAX_TTL_SECS));
    }
    Ok(Duration::from_secs(secs))
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
///
/// Must be called before any other thread is started: `main` calls it before building
/// the async runtime.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: Called from `main` before the runtime exists, so no other thread
        // can be reading the environment.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_jwt_secret(secret)
}

fn validate_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} bytes. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Generate a random 192-bit password, URL-safe base64 encoded.
pub fn generate_password() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// Handle the --create-admin flag: create an active admin with a generated password,
/// unless the email is already taken.
pub async fn handle_create_admin(db: &Database, email: &str) {
    match db.users().get_by_email(email).await {
        Ok(Some(existing)) => {
            println!();
            println!("User already exists: {}", existing.email);
            println!();
        }
        Ok(None) => {
            let password = generate_password();
            let hash = match BcryptComparator::hash(&password) {
                Ok(hash) => hash,
                Err(e) => {
                    error!(error = %e, "Failed to hash admin password");
                    std::process::exit(1);
                }
            };

            match db
                .users()
                .create(email, &hash, &[Role::User, Role::Admin], true)
                .await
            {
                Ok(_) => {
                    println!();
                    println!("Admin user created: {}", email);
                    println!("Password: {}", password);
                    println!();
                }
                Err(e) => {
                    error!(error = %e, "Failed to create admin user");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    login_attempts_per_minute: u32,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        ttls: TokenTtls {
            access: access_token_ttl,
            refresh: refresh_token_ttl,
        },
        login_attempts_per_minute,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tracker-auth"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.access_token_ttl, Duration::from_secs(30 * 60));
        assert_eq!(args.refresh_token_ttl, Duration::from_secs(14 * 24 * 60 * 60));
        assert_eq!(args.login_attempts_per_minute, 10);
        assert!(args.create_admin.is_none());
    }

    #[test]
    fn test_ttl_parsing() {
        let args = Args::try_parse_from([
            "tracker-auth",
            "--access-token-ttl",
            "60",
            "--create-admin",
            "root@example.com",
        ])
        .unwrap();
        assert_eq!(args.access_token_ttl, Duration::from_secs(60));
        assert_eq!(args.create_admin.as_deref(), Some("root@example.com"));

        assert!(Args::try_parse_from(["tracker-auth", "--access-token-ttl", "0"]).is_err());
        assert!(Args::try_parse_from(["tracker-auth", "--access-token-ttl", "soon"]).is_err());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let max = MAX_TTL_SECS.to_string();
        let args = Args::try_parse_from(["tracker-auth", "--refresh-token-ttl", max.as_str()]).unwrap();
        assert_eq!(args.refresh_token_ttl, Duration::from_secs(MAX_TTL_SECS));

        let over = (MAX_TTL_SECS + 1).to_string();
        assert!(Args::try_parse_from(["tracker-auth", "--refresh-token-ttl", over.as_str()]).is_err());
        let huge = u64::MAX.to_string();
        assert!(Args::try_parse_from(["tracker-auth", "--access-token-ttl", huge.as_str()]).is_err());
    }

    #[test]
    fn test_env_secret_removed_after_reading() {
        let secret = "e".repeat(MIN_JWT_SECRET_LENGTH);
        // SAFETY: no other test touches JWT_SECRET
        unsafe { std::env::set_var("JWT_SECRET", &secret) };

        assert_eq!(load_jwt_secret(None), Some(secret));
        assert!(std::env::var("JWT_SECRET").is_err());
        // Nothing left to read the second time, and no file given
        assert_eq!(load_jwt_secret(None), None);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(validate_jwt_secret("short".into()).is_none());
        let ok = "x".repeat(MIN_JWT_SECRET_LENGTH);
        assert_eq!(validate_jwt_secret(ok.clone()), Some(ok));
    }

    #[test]
    fn test_generated_passwords_differ() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_admin_stores_active_admin() {
        let db = Database::open(":memory:").await.unwrap();
        handle_create_admin(&db, "root@example.com").await;

        let admin = db.users().get_by_email("root@example.com").await.unwrap().unwrap();
        assert!(admin.active);
        assert!(admin.has_role(Role::Admin));
        assert!(admin.has_role(Role::User));

        // Second call leaves the existing account untouched
        handle_create_admin(&db, "root@example.com").await;
        let again = db.users().get_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(again.password_hash, admin.password_hash);
    }
}

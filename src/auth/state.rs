//! Shared, read-only state of the auth pipeline.

use std::sync::Arc;
use std::time::Duration;

use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL, TokenCodec};
use crate::rate_limit::LoginRateLimiter;

use super::directory::{BcryptComparator, SecretComparator};

/// Token lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: ACCESS_TOKEN_TTL,
            refresh: REFRESH_TOKEN_TTL,
        }
    }
}

/// Everything the auth middleware needs. Cheap to clone.
#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub comparator: Arc<dyn SecretComparator>,
    pub ttls: TokenTtls,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AuthState {
    pub fn new(
        db: Database,
        codec: Arc<TokenCodec>,
        ttls: TokenTtls,
        login_limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self {
            db,
            codec,
            comparator: Arc::new(BcryptComparator),
            ttls,
            login_limiter,
        }
    }
}

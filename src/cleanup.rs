//! Scheduled cleanup of stale refresh tokens.

use crate::db::Database;
use crate::jwt::{TokenCodec, TokenKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database, codec: &TokenCodec) {
    match clear_stale_refresh_tokens(db, codec).await {
        Ok(count) if count > 0 => info!("Cleaned up {} stale refresh tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up refresh tokens: {}", e),
    }
}

/// Clear stored refresh tokens that are expired or no longer verify (e.g. after a secret
/// rotation). A token replaced by a concurrent login is left alone.
pub async fn clear_stale_refresh_tokens(
    db: &Database,
    codec: &TokenCodec,
) -> Result<u64, sqlx::Error> {
    let users = db.users();
    let mut cleared = 0;

    for (id, token) in users.list_refresh_tokens().await? {
        if codec.parse_kind(&token, TokenKind::Refresh).is_ok() {
            continue;
        }
        if users.clear_refresh_token_if(id, &token).await? {
            cleared += 1;
        }
    }

    Ok(cleared)
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(
    db: Database,
    codec: Arc<TokenCodec>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db, &codec).await;
        }
    })
}

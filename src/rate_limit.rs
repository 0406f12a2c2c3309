//! Rate limiting for the login endpoint.
//!
//! Two token buckets are consulted per attempt: one per client address, and one per
//! address/identifier pair (just the identifier when the address is unknown). Spraying
//! guesses from one address hits the first; hammering one account hits the second without
//! locking its owner out from their own address.

use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default login attempts allowed per identifier per minute.
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

/// A client address may spend this many times the per-identifier quota across identifiers.
const CLIENT_QUOTA_MULTIPLIER: u32 = 5;

/// How often idle keys are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-client and per-identifier limiter for login attempts.
pub struct LoginRateLimiter {
    by_identifier: KeyedLimiter,
    by_client: KeyedLimiter,
    prune_interval: Duration,
    last_prune: Mutex<Instant>,
}

impl LoginRateLimiter {
    /// Allow `attempts_per_minute` attempts per identifier, all of them usable as a burst.
    /// Zero is treated as one.
    pub fn per_minute(attempts_per_minute: u32) -> Self {
        let attempts = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        let client_attempts = attempts.saturating_mul(
            NonZeroU32::new(CLIENT_QUOTA_MULTIPLIER).unwrap_or(NonZeroU32::MIN),
        );
        Self::with_quotas(
            Quota::per_minute(attempts),
            Quota::per_minute(client_attempts),
            PRUNE_INTERVAL,
        )
    }

    fn with_quotas(identifier: Quota, client: Quota, prune_interval: Duration) -> Self {
        Self {
            by_identifier: RateLimiter::keyed(identifier),
            by_client: RateLimiter::keyed(client),
            prune_interval,
            last_prune: Mutex::new(Instant::now()),
        }
    }

    /// Record an attempt. Returns false when the client or the identifier is over its quota.
    pub fn check(&self, identifier: &str, client: Option<IpAddr>) -> bool {
        self.maybe_prune();

        let identifier = identifier.trim().to_lowercase();
        let key = match client {
            Some(ip) => {
                if self.by_client.check_key(&ip.to_string()).is_err() {
                    return false;
                }
                format!("{}|{}", ip, identifier)
            }
            None => identifier,
        };

        self.by_identifier.check_key(&key).is_ok()
    }

    /// Drop keys whose buckets have refilled, releasing their memory.
    pub fn prune(&self) {
        self.by_identifier.retain_recent();
        self.by_identifier.shrink_to_fit();
        self.by_client.retain_recent();
        self.by_client.shrink_to_fit();
    }

    /// Number of tracked identifier keys.
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }

    fn maybe_prune(&self) {
        // Another thread already pruning is good enough
        let Ok(mut last) = self.last_prune.try_lock() else {
            return;
        };
        if last.elapsed() < self.prune_interval {
            return;
        }
        *last = Instant::now();
        drop(last);
        self.prune();
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::per_minute(DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE)
    }
}

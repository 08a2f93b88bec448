//! Storage for fixed-window rate limit counters.

use crate::domain::rate_limit::{RateLimitPolicy, WindowSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Errors that can occur while updating a counter.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitStoreError {
    #[error("rate limit backend error: {0}")]
    Backend(String),
}

/// Window table keyed by client identity.
///
/// `hit` is a single atomic increment-and-read: two concurrent hits for the same key
/// must never observe the same count.
///
/// # Implementations
///
/// - [`crate::infrastructure::rate_limit::MemoryRateLimitStore`] - in-process, per-key locking
/// - [`crate::infrastructure::rate_limit::RedisRateLimitStore`] - shared, server-side script
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one request for `key` at `now` and returns the window after the update.
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<WindowSnapshot, RateLimitStoreError>;
}

//! In-process rate limit store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::domain::rate_limit::{RateLimitPolicy, Window, WindowSnapshot};
use crate::domain::repositories::{RateLimitStore, RateLimitStoreError};

/// Window table held in a sharded concurrent map.
///
/// Each hit runs under the entry lock of its key, so increment-and-compare is
/// atomic per identity. Suitable for a single instance; use
/// [`super::RedisRateLimitStore`] when several instances share one limit.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        debug!("Using in-memory rate limit store");
        Self::default()
    }

    /// Number of identities currently tracked.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Removes windows that ended before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) {
        self.windows.retain(|_, window| !window.is_expired(now, policy));
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<WindowSnapshot, RateLimitStoreError> {
        let snapshot = self
            .windows
            .entry(key.to_string())
            .and_modify(|window| window.hit(now, policy))
            .or_insert_with(|| Window::open(now))
            .snapshot(policy);

        Ok(snapshot)
    }
}

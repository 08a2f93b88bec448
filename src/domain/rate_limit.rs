//! Fixed-window rate limiting model.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Maximum request count per window for one client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u64,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60 * 60),
        }
    }
}

impl RateLimitPolicy {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn window_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX)
    }
}

/// Counter state for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub count: u64,
    pub started_at: DateTime<Utc>,
}

impl Window {
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            started_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> bool {
        now > self.resets_at(policy)
    }

    pub fn resets_at(&self, policy: &RateLimitPolicy) -> DateTime<Utc> {
        self.started_at
            .checked_add_signed(policy.window_delta())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Records one hit.
    ///
    /// An expired window restarts at 1. Otherwise the count grows by one but never
    /// beyond `max_requests + 1`, so rejected traffic does not move the state further.
    pub fn hit(&mut self, now: DateTime<Utc>, policy: &RateLimitPolicy) {
        if self.is_expired(now, policy) {
            *self = Self::open(now);
        } else if self.count <= policy.max_requests {
            self.count += 1;
        }
    }

    pub fn snapshot(&self, policy: &RateLimitPolicy) -> WindowSnapshot {
        WindowSnapshot {
            count: self.count,
            resets_at: self.resets_at(policy),
        }
    }
}

/// Store view of a window right after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u64,
    pub resets_at: DateTime<Utc>,
}

/// Outcome of a rate limit check, exposed to handlers and response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    pub resets_at: DateTime<Utc>,
    pub admitted: bool,
}

impl RateLimitStatus {
    pub fn from_snapshot(snapshot: WindowSnapshot, policy: &RateLimitPolicy) -> Self {
        Self {
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(snapshot.count),
            resets_at: snapshot.resets_at,
            admitted: snapshot.count <= policy.max_requests,
        }
    }

    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.resets_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

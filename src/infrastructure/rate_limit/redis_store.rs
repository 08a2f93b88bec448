//! Redis-backed rate limit store.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use tracing::{error, info};

use crate::domain::rate_limit::{RateLimitPolicy, WindowSnapshot};
use crate::domain::repositories::{RateLimitStore, RateLimitStoreError};

/// Increments the counter, starts the expiry on the first hit of a window and
/// returns `{count, remaining_ttl_ms}`. Runs atomically on the server.
const HIT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

/// Window table shared by every instance connected to the same Redis.
///
/// Window expiry is driven by Redis key TTLs, so the server clock decides when a
/// window ends; the `now` passed to [`RateLimitStore::hit`] only anchors the
/// reported reset time.
pub struct RedisRateLimitStore {
    client: ConnectionManager,
    script: Script,
    key_prefix: String,
}

impl RedisRateLimitStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError::Backend`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> Result<Self, RateLimitStoreError> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            RateLimitStoreError::Backend(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            RateLimitStoreError::Backend(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| RateLimitStoreError::Backend(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            script: Script::new(HIT_SCRIPT),
            key_prefix: "ratelimit:".to_string(),
        })
    }

    fn build_key(&self, identity: &str) -> String {
        format!("{}{}", self.key_prefix, identity)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> Result<WindowSnapshot, RateLimitStoreError> {
        let key = self.build_key(key);
        let mut conn = self.client.clone();
        let window_ms = policy.window.as_millis().max(1) as u64;

        let (count, ttl_ms): (u64, i64) = self
            .script
            .key(&key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis rate limit script failed for {}: {}", key, e);
                RateLimitStoreError::Backend(e.to_string())
            })?;

        Ok(WindowSnapshot {
            count,
            resets_at: now + TimeDelta::milliseconds(ttl_ms.max(0)),
        })
    }
}

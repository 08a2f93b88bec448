//! Rate limit window storage.
//!
//! Provides two [`crate::domain::repositories::RateLimitStore`] implementations:
//! - [`MemoryRateLimitStore`] - Sharded in-process map, the default
//! - [`RedisRateLimitStore`] - Shared counters for multi-instance deployments

mod memory_store;
mod redis_store;

pub use memory_store::MemoryRateLimitStore;
pub use redis_store::RedisRateLimitStore;

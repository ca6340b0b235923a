//! Expiring key-value storage for liveness markers.
//!
//! Any store that can write a key with a time-to-live and stops returning it once the TTL has
//! elapsed satisfies [`ExpiringCache`]. Redis/Valkey is used across processes, the in-memory
//! store within a single process and in tests.

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use std::time::Duration;

use async_trait::async_trait;

use crate::server::error::Error;

#[async_trait]
pub trait ExpiringCache: Send + Sync {
    /// Value stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;
}

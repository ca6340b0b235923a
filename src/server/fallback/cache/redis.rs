use std::time::Duration;

use async_trait::async_trait;
use fred::{prelude::*, types::Expiration};

use super::ExpiringCache;
use crate::server::error::Error;

/// Expiring cache backed by Redis/Valkey key expiry.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpiringCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let value: Option<String> = self.pool.get(key).await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        // PX 0 is rejected by Redis
        let ttl_ms = ttl.as_millis().clamp(1, i64::MAX as u128) as i64;

        let _: () = self
            .pool
            .set(key, value, Some(Expiration::PX(ttl_ms)), None, false)
            .await?;

        Ok(())
    }
}

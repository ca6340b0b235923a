//! Liveness markers for dedicated workers.
//!
//! A marker is a single expiring cache key per queue. It is written by heartbeats of real
//! workers and left to expire on its own, a marker past its TTL means nobody is servicing the
//! queue.

use std::{sync::Arc, time::Duration};

use crate::server::{
    error::{fallback::FallbackError, Error},
    fallback::cache::ExpiringCache,
};

const DEFAULT_KEY_PREFIX: &str = "ferry:worker-alive";

/// Answers "is a real worker servicing queue Q right now?"
#[derive(Clone)]
pub struct LivenessTracker {
    cache: Arc<dyn ExpiringCache>,
    key_prefix: String,
}

impl LivenessTracker {
    pub fn new(cache: Arc<dyn ExpiringCache>) -> Self {
        Self::with_key_prefix(cache, DEFAULT_KEY_PREFIX.to_string())
    }

    /// Create a tracker with a custom key prefix (useful for test isolation)
    pub fn with_key_prefix(cache: Arc<dyn ExpiringCache>, key_prefix: String) -> Self {
        Self { cache, key_prefix }
    }

    /// Marks `queue` as serviced for the next `grace_period`.
    ///
    /// # Returns
    /// - `Ok(())` - Marker written or refreshed
    /// - `Err(Error::FallbackError)` - The backing cache is unreachable
    pub async fn ping(&self, queue: &str, grace_period: Duration) -> Result<(), Error> {
        let key = self.marker_key(queue);

        self.cache
            .set(&key, "1", grace_period)
            .await
            .map_err(|e| storage_unavailable(key, e))
    }

    /// Whether a non-expired marker exists for `queue`.
    ///
    /// Storage failures are logged and reported as "not alive" so that callers fall back to
    /// draining instead of leaving messages unprocessed.
    pub async fn is_alive(&self, queue: &str) -> bool {
        match self.try_is_alive(queue).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!("Assuming no worker is alive for queue {}: {}", queue, e);
                false
            }
        }
    }

    /// Like [`is_alive`](Self::is_alive) but surfaces storage failures.
    pub async fn try_is_alive(&self, queue: &str) -> Result<bool, Error> {
        let key = self.marker_key(queue);

        let marker = self
            .cache
            .get(&key)
            .await
            .map_err(|e| storage_unavailable(key, e))?;

        Ok(marker.is_some())
    }

    fn marker_key(&self, queue: &str) -> String {
        format!("{}:{}", self.key_prefix, queue)
    }
}

fn storage_unavailable(key: String, err: Error) -> Error {
    FallbackError::StorageUnavailable {
        key,
        reason: err.to_string(),
    }
    .into()
}

use fred::prelude::*;

use crate::TestError;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Deletes every key matching ARGV[1]
const DELETE_PREFIX_SCRIPT: &str = r#"
local keys = redis.call('KEYS', ARGV[1])
for _, key in ipairs(keys) do
    redis.call('DEL', key)
end
return #keys
"#;

/// Redis test setup with automatic cleanup
///
/// This struct manages a Redis connection pool and a unique key prefix for testing. Every key
/// under the prefix is deleted when the struct is dropped.
///
/// Connects to `REDIS_TEST_URL`, falling back to a local instance on the default port.
pub struct RedisTest {
    pub redis_pool: Pool,
    key_prefix: String,
}

impl RedisTest {
    /// Create a new RedisTest instance with a unique key prefix
    pub async fn new() -> Result<Self, TestError> {
        let url = std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let redis_config = Config::from_url(&url)?;
        let redis_pool = Pool::new(redis_config, None, None, None, 5)?;
        redis_pool.init().await?;

        Ok(RedisTest {
            redis_pool,
            key_prefix: Self::generate_unique_prefix(),
        })
    }

    /// Unique prefix for every key this test writes
    ///
    /// Tests running in parallel against the same Redis never see each other's data.
    pub fn key_prefix(&self) -> String {
        self.key_prefix.clone()
    }

    /// `name` namespaced under this test's prefix
    pub fn key(&self, name: &str) -> String {
        format!("{}:{}", self.key_prefix, name)
    }

    /// Delete every key under this test's prefix
    pub async fn cleanup(&self) -> Result<(), TestError> {
        let _deleted: i64 = self
            .redis_pool
            .eval(
                DELETE_PREFIX_SCRIPT,
                Vec::<String>::new(),
                vec![format!("{}:*", self.key_prefix)],
            )
            .await?;

        Ok(())
    }

    /// Generate a unique prefix using timestamp and thread ID
    fn generate_unique_prefix() -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        use std::time::{SystemTime, UNIX_EPOCH};

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut hasher = DefaultHasher::new();
        timestamp.hash(&mut hasher);
        std::thread::current().id().hash(&mut hasher);

        format!("test:{}:{:x}", timestamp, hasher.finish())
    }
}

impl Drop for RedisTest {
    fn drop(&mut self) {
        // Spawned rather than blocked on, dropping inside a runtime can't block
        let pool = self.redis_pool.clone();
        let pattern = format!("{}:*", self.key_prefix);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _: Result<i64, fred::error::Error> = pool
                    .eval(DELETE_PREFIX_SCRIPT, Vec::<String>::new(), vec![pattern])
                    .await;
            });
        }
    }
}

//! Message queue configuration.

const DEFAULT_KEY_PREFIX: &str = "ferry:queue";

/// Configuration for the Redis message queue.
#[derive(Debug, Clone)]
pub struct MessageQueueConfig {
    /// Prefix of the Redis sorted set keys, the queue name is appended as `{prefix}:{queue}`
    pub key_prefix: String,
}

impl MessageQueueConfig {
    /// Creates a queue configuration with the default `ferry:queue` prefix.
    fn new() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Redis key holding the given queue
    pub fn queue_key(&self, queue: &str) -> String {
        format!("{}:{}", self.key_prefix, queue)
    }
}

impl Default for MessageQueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

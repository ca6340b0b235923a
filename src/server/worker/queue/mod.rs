//! Message queues consumed by workers.
//!
//! Queues are named, a message is pushed to exactly one queue and popped by exactly one
//! consumer. Messages carry an `available_at` timestamp and are only handed out once it has
//! passed, which is how delayed delivery and retry backoff are implemented.
//!
//! Two implementations are provided:
//! - [`RedisMessageQueue`]: sorted set per queue, scored by availability, shared across processes
//! - [`MemoryMessageQueue`]: process-local, used by tests and single-process setups

pub mod config;
mod lua;
mod memory;
mod redis;

pub use config::MessageQueueConfig;
pub use memory::MemoryMessageQueue;
pub use redis::RedisMessageQueue;

use async_trait::async_trait;

use crate::server::{error::Error, model::message::Message};

/// Storage for queued messages.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Adds a message to `queue`.
    async fn push(&self, queue: &str, message: &Message) -> Result<(), Error>;

    /// Removes and returns the earliest message of `queue` whose `available_at` has passed.
    ///
    /// # Returns
    /// - `Ok(Some(Message))` - A ready message, now owned by the caller
    /// - `Ok(None)` - No message is ready
    /// - `Err(Error)` - Storage or deserialization failure
    async fn pop(&self, queue: &str) -> Result<Option<Message>, Error>;

    /// Number of messages in `queue`, including ones not yet available.
    async fn len(&self, queue: &str) -> Result<u64, Error>;

    async fn is_empty(&self, queue: &str) -> Result<bool, Error> {
        Ok(self.len(queue).await? == 0)
    }
}

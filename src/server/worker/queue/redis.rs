use async_trait::async_trait;
use chrono::Utc;
use fred::prelude::*;

use super::{
    config::MessageQueueConfig,
    lua::{POP_MESSAGE_SCRIPT, PUSH_MESSAGE_SCRIPT},
    MessageQueue,
};
use crate::server::{error::Error, model::message::Message};

/// Redis-backed message queue, one sorted set per queue.
#[derive(Clone)]
pub struct RedisMessageQueue {
    pool: Pool,
    config: MessageQueueConfig,
}

impl RedisMessageQueue {
    pub fn new(pool: Pool) -> Self {
        Self::with_config(pool, MessageQueueConfig::default())
    }

    /// Create a queue with a custom configuration (useful for testing)
    pub fn with_config(pool: Pool, config: MessageQueueConfig) -> Self {
        Self { pool, config }
    }
}

#[async_trait]
impl MessageQueue for RedisMessageQueue {
    async fn push(&self, queue: &str, message: &Message) -> Result<(), Error> {
        let key = self.config.queue_key(queue);
        let score = message.available_at.timestamp_millis();

        let _added: i64 = self
            .pool
            .eval(
                PUSH_MESSAGE_SCRIPT,
                vec![key],
                vec![message.to_json()?, score.to_string()],
            )
            .await?;

        tracing::debug!("Pushed {} to queue {}", message, queue);

        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<Message>, Error> {
        let key = self.config.queue_key(queue);
        let now = Utc::now().timestamp_millis();

        let raw: Option<String> = self
            .pool
            .eval(POP_MESSAGE_SCRIPT, vec![key], vec![now.to_string()])
            .await?;

        match raw {
            Some(raw) => Ok(Some(Message::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    async fn len(&self, queue: &str) -> Result<u64, Error> {
        let key = self.config.queue_key(queue);
        let len: u64 = self.pool.zcard(key).await?;

        Ok(len)
    }
}

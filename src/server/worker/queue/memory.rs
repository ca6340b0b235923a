use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::MessageQueue;
use crate::server::{error::Error, model::message::Message};

/// Process-local message queue.
///
/// Messages are handed out by earliest `available_at`, ties in insertion order.
#[derive(Default)]
pub struct MemoryMessageQueue {
    queues: Mutex<HashMap<String, VecDeque<Message>>>,
}

impl MemoryMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageQueue for MemoryMessageQueue {
    async fn push(&self, queue: &str, message: &Message) -> Result<(), Error> {
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(message.clone());

        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<Message>, Error> {
        let mut queues = self.queues.lock().await;
        let Some(messages) = queues.get_mut(queue) else {
            return Ok(None);
        };

        let now = Utc::now();
        let next = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.available_at <= now)
            .min_by_key(|(_, m)| m.available_at)
            .map(|(index, _)| index);

        Ok(next.and_then(|index| messages.remove(index)))
    }

    async fn len(&self, queue: &str) -> Result<u64, Error> {
        let queues = self.queues.lock().await;

        Ok(queues.get(queue).map_or(0, |m| m.len() as u64))
    }
}

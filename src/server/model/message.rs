//! Message definitions for queued work.
//!
//! A `Message` is the unit stored on a queue. It is serialized to JSON for Redis storage and
//! deserialized by the consumer, which routes it to the handler registered for its `kind`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::server::error::{worker::WorkerError, Error};

/// Longest queue name accepted, queue names end up inside Redis keys.
const MAX_QUEUE_NAME_LEN: usize = 64;

/// A queued message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Random identifier, also keeps identical payloads distinct inside a sorted set.
    pub id: String,
    /// Handler the message is routed to.
    pub kind: String,
    /// Handler-specific data.
    pub payload: serde_json::Value,
    /// When the message was first enqueued.
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time a worker may receive the message.
    pub available_at: DateTime<Utc>,
    /// Number of failed delivery attempts so far.
    #[serde(default)]
    pub attempts: u32,
}

impl Message {
    /// Creates a message that is available immediately.
    ///
    /// # Arguments
    /// - `kind` - Handler the message is routed to
    /// - `payload` - Handler-specific data
    ///
    /// # Returns
    /// - `Message` - New message with a random id
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        let now = Utc::now();

        Self {
            id: Self::generate_id(),
            kind: kind.into(),
            payload,
            enqueued_at: now,
            available_at: now,
            attempts: 0,
        }
    }

    /// Delays availability of the message by `delay` from now.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.available_at = Utc::now() + delay;
        self
    }

    /// Copy of this message scheduled for redelivery after a failed attempt.
    pub fn redelivery(&self, backoff: Duration) -> Self {
        Self {
            attempts: self.attempts + 1,
            available_at: Utc::now() + backoff,
            ..self.clone()
        }
    }

    /// Serializes the message for storage.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self)
            .map_err(|e| WorkerError::SerializationError(e.to_string()).into())
    }

    /// Deserializes a stored message.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        serde_json::from_str(raw).map_err(|e| WorkerError::SerializationError(e.to_string()).into())
    }

    fn generate_id() -> String {
        let id: u128 = rand::rng().random();
        format!("{:032x}", id)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, attempt {})", self.kind, self.id, self.attempts + 1)
    }
}

/// Validates a queue name before it is used in a storage key.
///
/// # Returns
/// - `Ok(())` - Name is non-empty, at most 64 characters and only `[A-Za-z0-9_.-]`
/// - `Err(Error::WorkerError)` - Name is invalid
pub fn validate_queue_name(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && name.len() <= MAX_QUEUE_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(WorkerError::InvalidQueueName(name.to_string()).into())
    }
}

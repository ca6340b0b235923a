use serde::{Deserialize, Serialize};

/// The response when an error occurs with an API request
#[derive(Serialize, Deserialize)]
pub struct ErrorDto {
    /// The error message
    pub error: String,
}

/// Request body for enqueueing a message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnqueueMessageDto {
    /// Handler the message is routed to
    pub kind: String,
    /// Arbitrary JSON payload passed to the handler
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Delay before the message becomes available to workers
    #[serde(default)]
    pub delay_seconds: Option<u64>,
}

/// Response after a message has been enqueued
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnqueuedMessageDto {
    pub id: String,
    pub queue: String,
}

/// Pending message count and worker liveness for a queue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueueStatusDto {
    pub queue: String,
    pub pending: u64,
    pub worker_alive: bool,
}

//! Execution of a single received message.
//!
//! Shared by the bounded consumer and the dedicated worker pool: runs the handler under a
//! timeout, logs the outcome and redelivers retryable failures with exponential backoff.

use std::{sync::Arc, time::Duration};

use crate::server::{
    error::{retry::ErrorRetryStrategy, worker::WorkerError, Error},
    model::message::Message,
    worker::{handler::HandlerRegistry, queue::MessageQueue},
};

/// Redelivery policy for failed messages.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total delivery attempts before a message is dropped.
    pub max_attempts: u32,
    /// Backoff before the first redelivery, doubled for each further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Backoff before redelivering a message that has failed `attempts + 1` times
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempts))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Handled,
    /// Failed and put back on the queue for another attempt.
    Redelivered,
    /// Failed permanently or ran out of attempts.
    Dropped,
}

#[derive(Clone)]
pub struct MessageProcessor {
    queue: Arc<dyn MessageQueue>,
    handlers: Arc<HandlerRegistry>,
    retry: RetryPolicy,
}

impl MessageProcessor {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        handlers: Arc<HandlerRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            handlers,
            retry,
        }
    }

    pub fn queue(&self) -> &Arc<dyn MessageQueue> {
        &self.queue
    }

    /// Processes a message received from `queue_name`.
    ///
    /// # Arguments
    /// - `queue_name` - Queue the message was popped from, used for redelivery
    /// - `message` - Message to handle
    /// - `timeout` - Maximum time the handler may run
    pub async fn process(
        &self,
        queue_name: &str,
        message: Message,
        timeout: Duration,
    ) -> ProcessOutcome {
        let result = match tokio::time::timeout(timeout, self.handlers.handle(&message)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::HandlerTimeout {
                kind: message.kind.clone(),
                seconds: timeout.as_secs(),
            }
            .into()),
        };

        match result {
            Ok(()) => {
                tracing::debug!("Message handled: {}", message);
                ProcessOutcome::Handled
            }
            Err(e) => self.handle_failure(queue_name, message, e).await,
        }
    }

    async fn handle_failure(&self, queue_name: &str, message: Message, err: Error) -> ProcessOutcome {
        let retryable = err.to_retry_strategy() == ErrorRetryStrategy::Retry;

        if !retryable || message.attempts + 1 >= self.retry.max_attempts {
            tracing::error!("Message failed permanently: {}, error: {}", message, err);
            return ProcessOutcome::Dropped;
        }

        let backoff = self.retry.backoff_for(message.attempts);
        let redelivery = match chrono::Duration::from_std(backoff) {
            Ok(backoff) => message.redelivery(backoff),
            Err(_) => message.redelivery(chrono::Duration::zero()),
        };

        tracing::warn!(
            "Message failed: {}, error: {}, retrying in {} seconds",
            message,
            err,
            backoff.as_secs()
        );

        match self.queue.push(queue_name, &redelivery).await {
            Ok(()) => ProcessOutcome::Redelivered,
            Err(e) => {
                tracing::error!("Failed to redeliver {} to {}: {}", message, queue_name, e);
                ProcessOutcome::Dropped
            }
        }
    }
}

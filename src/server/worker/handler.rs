use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::server::{
    error::{worker::WorkerError, Error},
    model::message::Message,
};

/// Business logic for one kind of message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> Result<(), Error>;
}

/// Routes messages to the handler registered for their `kind`
///
/// The set of handlers is fixed once the registry is built, which is what lets the HTTP layer
/// reject unknown kinds before they ever reach a queue.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages of `kind`, replacing any previous handler
    pub fn register(mut self, kind: impl Into<String>, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.insert(kind.into(), handler);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Handle a message by delegating to the handler registered for its kind
    ///
    /// # Returns
    /// - `Ok(())` - Handler completed
    /// - `Err(Error::WorkerError)` - No handler for the kind
    /// - `Err(Error)` - Whatever the handler returned
    pub async fn handle(&self, message: &Message) -> Result<(), Error> {
        let handler = self
            .handlers
            .get(&message.kind)
            .ok_or_else(|| WorkerError::UnknownMessageKind(message.kind.clone()))?;

        handler.handle(message).await
    }
}

/// Handler that only logs what it receives.
pub struct LogHandler;

#[async_trait]
impl MessageHandler for LogHandler {
    async fn handle(&self, message: &Message) -> Result<(), Error> {
        tracing::info!("Handled {} with payload {}", message, message.payload);

        Ok(())
    }
}

use std::sync::Arc;

use crate::server::{
    error::Error,
    fallback::MessageCounter,
    model::message::{validate_queue_name, Message},
    worker::queue::MessageQueue,
};

/// Enqueue path: pushes messages and records them with the unit of work's counter.
#[derive(Clone)]
pub struct MessageBus {
    queue: Arc<dyn MessageQueue>,
}

impl MessageBus {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Pushes `message` to `queue_name` and counts it towards the current unit of work.
    ///
    /// # Arguments
    /// - `counter` - Counter of the current unit of work, `None` outside of one (e.g. from a
    ///   dedicated worker)
    /// - `queue_name` - Target queue
    /// - `message` - Message to enqueue
    ///
    /// # Returns
    /// - `Ok(())` - Message stored
    /// - `Err(Error::WorkerError)` - Invalid queue name
    /// - `Err(Error)` - Storage failure, nothing was counted
    pub async fn dispatch(
        &self,
        counter: Option<&MessageCounter>,
        queue_name: &str,
        message: &Message,
    ) -> Result<(), Error> {
        validate_queue_name(queue_name)?;

        self.queue.push(queue_name, message).await?;

        if let Some(counter) = counter {
            counter.record_enqueue(queue_name);
        }

        Ok(())
    }

    pub fn queue(&self) -> &Arc<dyn MessageQueue> {
        &self.queue
    }
}

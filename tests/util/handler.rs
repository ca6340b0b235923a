use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use async_trait::async_trait;
use ferry::server::{
    error::Error,
    fallback::MessageCounter,
    model::message::Message,
    worker::{handler::MessageHandler, MessageBus},
};
use parking_lot::Mutex;
use serde_json::json;

/// Records the id of every message it handles.
#[derive(Default)]
pub struct RecordingHandler {
    ids: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn count(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &Message) -> Result<(), Error> {
        self.ids.lock().push(message.id.clone());
        Ok(())
    }
}

/// Sleeps before succeeding.
pub struct SlowHandler(pub Duration);

impl SlowHandler {
    pub fn secs(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }
}

#[async_trait]
impl MessageHandler for SlowHandler {
    async fn handle(&self, _message: &Message) -> Result<(), Error> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

/// Enqueues a follow-up message with a unit of work's counter, like application code running
/// inside a drained job would.
///
/// The counter is set once the scheduler exists, messages handled before that are not counted.
pub struct FollowUpHandler {
    pub bus: MessageBus,
    pub counter: Arc<OnceLock<MessageCounter>>,
    pub queue: String,
    pub follow_up_kind: String,
}

#[async_trait]
impl MessageHandler for FollowUpHandler {
    async fn handle(&self, message: &Message) -> Result<(), Error> {
        let follow_up = Message::new(self.follow_up_kind.clone(), json!({ "parent": message.id }));

        self.bus
            .dispatch(self.counter.get(), &self.queue, &follow_up)
            .await
    }
}

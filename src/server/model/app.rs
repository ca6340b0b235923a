use std::sync::Arc;

use crate::server::{
    fallback::FallbackScheduler,
    worker::{handler::HandlerRegistry, MessageBus},
};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<FallbackScheduler>,
    pub bus: MessageBus,
    pub handlers: Arc<HandlerRegistry>,
}

//! Message consumption.
//!
//! - [`queue`]: where messages wait
//! - [`bus`]: the enqueue path
//! - [`handler`] and [`processor`]: what happens to a received message
//! - [`consumer`]: bounded consume passes, used by fallback drains
//! - [`pool`]: the dedicated, long-running worker
//! - [`event`]: lifecycle signals both of them emit

pub mod bus;
pub mod consumer;
pub mod event;
pub mod handler;
pub mod pool;
pub mod processor;
pub mod queue;

pub use bus::MessageBus;
pub use consumer::{BoundedConsumer, ConsumerConfig, Worker};
pub use pool::WorkerPool;
pub use queue::MessageQueue;

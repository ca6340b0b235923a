//! Worker lifecycle signals.
//!
//! Every consume loop reports when it starts, after each iteration and when it stops. The
//! listener is chosen by whoever runs the loop: dedicated workers use a heartbeat that keeps
//! their queues' liveness markers fresh, the fallback scheduler listens to its own drains to
//! suppress heartbeats and stop as soon as the queue runs dry.

use async_trait::async_trait;

/// Decision returned by a listener after an iteration of the consume loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerControl {
    Continue,
    Stop,
}

#[async_trait]
pub trait WorkerListener: Send + Sync {
    /// The worker is about to start consuming `queues`.
    async fn on_worker_started(&self, queues: &[String]);

    /// One iteration finished, `is_idle` is true when no message was ready.
    async fn on_worker_running(&self, queues: &[String], is_idle: bool) -> WorkerControl;

    /// The worker stopped consuming `queues`.
    async fn on_worker_stopped(&self, queues: &[String]);
}

/// Listener that ignores every signal.
pub struct NoopListener;

#[async_trait]
impl WorkerListener for NoopListener {
    async fn on_worker_started(&self, _queues: &[String]) {}

    async fn on_worker_running(&self, _queues: &[String], _is_idle: bool) -> WorkerControl {
        WorkerControl::Continue
    }

    async fn on_worker_stopped(&self, _queues: &[String]) {}
}

use std::time::Duration;

use async_trait::async_trait;

use crate::server::{
    fallback::{config::FallbackConfig, liveness::LivenessTracker},
    worker::event::{WorkerControl, WorkerListener},
};

/// Worker listener that keeps liveness markers fresh for a dedicated worker.
///
/// This is the only path that extends liveness. Queues the fallback doesn't manage are skipped.
#[derive(Clone)]
pub struct Heartbeat {
    liveness: LivenessTracker,
    config: FallbackConfig,
}

impl Heartbeat {
    pub fn new(liveness: LivenessTracker, config: FallbackConfig) -> Self {
        Self { liveness, config }
    }

    pub fn grace_period(&self) -> Duration {
        self.config.grace_period
    }

    /// Pings every managed queue in `queues`.
    ///
    /// Storage failures are logged, a missed heartbeat at worst causes a redundant drain.
    pub async fn beat(&self, queues: &[String]) {
        for queue in queues.iter().filter(|q| self.config.manages(q)) {
            if let Err(e) = self.liveness.ping(queue, self.config.grace_period).await {
                tracing::warn!("Failed to record heartbeat for queue {}: {}", queue, e);
            }
        }
    }
}

#[async_trait]
impl WorkerListener for Heartbeat {
    async fn on_worker_started(&self, queues: &[String]) {
        self.beat(queues).await;
    }

    async fn on_worker_running(&self, queues: &[String], _is_idle: bool) -> WorkerControl {
        self.beat(queues).await;
        WorkerControl::Continue
    }

    async fn on_worker_stopped(&self, _queues: &[String]) {}
}

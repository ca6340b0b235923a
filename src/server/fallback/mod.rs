//! Fallback worker scheduling.
//!
//! Guarantees forward progress on queues when no dedicated worker is running, without piling
//! redundant work on top of one that is.
//!
//! ## Flow
//!
//! 1. [`FallbackScheduler::begin_unit_of_work`] hands out a [`MessageCounter`] for the request.
//! 2. The enqueue path calls [`MessageCounter::record_enqueue`] for every message it publishes.
//! 3. [`FallbackScheduler::on_unit_of_work_end`] consumes the tally, picks candidate queues
//!    according to the [`FallbackPolicy`] and checks their liveness markers.
//! 4. Every queue without a live marker is drained synchronously, bounded by message count,
//!    wall clock and memory.
//!
//! ## Self-reinforcement
//!
//! A drain runs inside a task-local drain scope. Code executing within that scope is the
//! fallback itself: its lifecycle signals never refresh liveness (otherwise the fallback would
//! convince itself a real worker exists), an idle signal stops it immediately and enqueues from
//! drained jobs are not counted. Concurrent units of work run outside the scope and keep their
//! own tallies and decisions while another request drains. The scope ends with the consumer
//! future, so errors and panics can't leave it set.

pub mod cache;
pub mod config;
pub mod counter;
pub mod directive;
pub mod heartbeat;
pub mod liveness;
pub mod middleware;

pub use config::{FallbackConfig, FallbackHook, FallbackPolicy};
pub use counter::MessageCounter;
pub use directive::DrainDirective;
pub use heartbeat::Heartbeat;
pub use liveness::LivenessTracker;

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;

use crate::server::worker::{
    consumer::{BoundedConsumer, ConsumeReport},
    event::{WorkerControl, WorkerListener},
};

tokio::task_local! {
    static DRAIN_SCOPE: ();
}

/// Whether the current task is executing inside a fallback drain.
pub fn in_drain() -> bool {
    DRAIN_SCOPE.try_with(|_| ()).is_ok()
}

/// Runs `fut` inside a drain scope.
///
/// Tasks spawned from `fut` do not inherit the scope.
pub async fn within_drain<F: Future>(fut: F) -> F::Output {
    DRAIN_SCOPE.scope((), fut).await
}

/// Number of drains in progress on a scheduler, across all tasks.
#[derive(Clone, Default)]
pub struct DrainCount(Arc<AtomicUsize>);

impl DrainCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Counts one drain until the returned guard is dropped.
    pub fn enter(&self) -> DrainGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        DrainGuard(self.clone())
    }
}

/// Releases one drain from a [`DrainCount`] on drop.
pub struct DrainGuard(DrainCount);

impl Drop for DrainGuard {
    fn drop(&mut self) {
        (self.0).0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Result of one drain.
#[derive(Debug, Clone)]
pub struct DrainOutcome {
    pub directive: DrainDirective,
    /// `None` when the consumer itself failed, the failure has already been logged.
    pub report: Option<ConsumeReport>,
}

/// Decides at the end of each unit of work whether queues must be drained inline.
///
/// One instance per process, shared behind an `Arc` wherever lifecycle hooks fire.
pub struct FallbackScheduler {
    config: FallbackConfig,
    heartbeat: Heartbeat,
    liveness: LivenessTracker,
    consumer: Arc<dyn BoundedConsumer>,
    active: DrainCount,
}

impl FallbackScheduler {
    /// Creates a scheduler.
    ///
    /// # Arguments
    /// - `config` - Policy, managed queues and limits
    /// - `liveness` - Liveness markers shared with dedicated workers
    /// - `consumer` - Bounded consumer used for drains
    pub fn new(
        config: FallbackConfig,
        liveness: LivenessTracker,
        consumer: Arc<dyn BoundedConsumer>,
    ) -> Self {
        Self {
            heartbeat: Heartbeat::new(liveness.clone(), config.clone()),
            config,
            liveness,
            consumer,
            active: DrainCount::default(),
        }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    pub fn liveness(&self) -> &LivenessTracker {
        &self.liveness
    }

    /// Whether any drain of this scheduler is in progress, in any task.
    ///
    /// Informational only. Decisions depend on [`in_drain`], which is scoped to the drain's own
    /// task.
    pub fn is_fallback_running(&self) -> bool {
        self.active.get() > 0
    }

    /// Starts a unit of work with an empty tally.
    pub fn begin_unit_of_work(&self) -> MessageCounter {
        MessageCounter::new()
    }

    /// Ends a unit of work: consumes its tally and drains every candidate queue that has no
    /// live worker.
    ///
    /// Never fails, consumer errors are logged and reported as an outcome without report.
    /// Called from inside a drain (a drained job ending its own unit of work), it does nothing.
    /// Units of work in other tasks are unaffected by drains running elsewhere.
    pub async fn on_unit_of_work_end(&self, counter: &MessageCounter) -> Vec<DrainOutcome> {
        let tally = counter.drain_tally();

        if in_drain() {
            tracing::debug!("Fallback drain in progress, skipping nested unit of work end");
            return Vec::new();
        }

        let mut outcomes = Vec::new();

        for directive in self.plan(&tally) {
            if self.liveness.is_alive(&directive.queue).await {
                tracing::debug!("Worker alive for queue {}, no drain needed", directive.queue);
                continue;
            }

            outcomes.push(self.drain(directive).await);
        }

        outcomes
    }

    /// Candidate drains for a tally, before liveness is checked.
    ///
    /// Ordered by queue name for the request-proportional policy and by configuration order for
    /// the fixed-budget policy.
    pub fn plan(&self, tally: &HashMap<String, u64>) -> Vec<DrainDirective> {
        match self.config.policy {
            FallbackPolicy::RequestProportional { margin } => {
                let mut queues: Vec<(&String, &u64)> = tally
                    .iter()
                    .filter(|(queue, count)| **count > 0 && self.config.manages(queue))
                    .collect();
                queues.sort_by(|a, b| a.0.cmp(b.0));

                queues
                    .into_iter()
                    .map(|(queue, count)| {
                        DrainDirective::request_proportional(
                            queue.clone(),
                            *count,
                            margin,
                            self.config.time_limit,
                        )
                    })
                    .collect()
            }
            FallbackPolicy::FixedBudget => self
                .config
                .queues
                .iter()
                .map(|queue| {
                    DrainDirective::fixed_budget(
                        queue.clone(),
                        self.config.time_limit,
                        self.config.memory_limit_bytes,
                    )
                })
                .collect(),
        }
    }

    /// Runs one bounded drain inside a drain scope.
    pub async fn drain(&self, directive: DrainDirective) -> DrainOutcome {
        let _guard = self.active.enter();

        tracing::info!(
            "No worker alive for queue {}, draining up to {} message(s) for at most {} seconds",
            directive.queue,
            directive
                .message_limit
                .map_or_else(|| "unlimited".to_string(), |limit| limit.to_string()),
            directive.time_limit_seconds()
        );

        let report = match within_drain(self.consumer.consume(&directive, self)).await {
            Ok(report) => {
                tracing::info!(
                    "Fallback drain of queue {} finished: {} handled, {} failed, stopped by {:?}",
                    directive.queue,
                    report.handled,
                    report.failed,
                    report.stop_reason
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!("Fallback drain of queue {} failed: {}", directive.queue, e);
                None
            }
        };

        DrainOutcome { directive, report }
    }
}

#[async_trait]
impl WorkerListener for FallbackScheduler {
    async fn on_worker_started(&self, queues: &[String]) {
        if in_drain() {
            return;
        }

        self.heartbeat.beat(queues).await;
    }

    async fn on_worker_running(&self, queues: &[String], is_idle: bool) -> WorkerControl {
        if in_drain() {
            return if is_idle {
                WorkerControl::Stop
            } else {
                WorkerControl::Continue
            };
        }

        self.heartbeat.beat(queues).await;
        WorkerControl::Continue
    }

    async fn on_worker_stopped(&self, _queues: &[String]) {}
}

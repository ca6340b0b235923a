//! Bounded message consumer.
//!
//! Runs a consume loop over one queue until a limit is hit: message count, wall clock, memory,
//! or a listener asking it to stop. Every await inside the loop (receiving, handling, idling)
//! is capped at the time limit's deadline, so a drain never outlives its time limit by more
//! than the redelivery write of a message cut off by the deadline.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::server::{
    error::Error,
    fallback::directive::DrainDirective,
    util::memory::MemoryProbe,
    worker::{
        event::{WorkerControl, WorkerListener},
        processor::{MessageProcessor, ProcessOutcome},
    },
};

/// Why a consume loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MessageLimit,
    TimeLimit,
    MemoryLimit,
    /// The listener returned [`WorkerControl::Stop`].
    Listener,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeReport {
    pub handled: u64,
    pub failed: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl ConsumeReport {
    /// Messages received, whether they succeeded or not.
    pub fn received(&self) -> u64 {
        self.handled + self.failed
    }
}

/// Runs a bounded consume pass for a drain directive.
#[async_trait]
pub trait BoundedConsumer: Send + Sync {
    /// Consumes `directive.queue` within the directive's limits, reporting lifecycle signals to
    /// `listener`.
    async fn consume(
        &self,
        directive: &DrainDirective,
        listener: &dyn WorkerListener,
    ) -> Result<ConsumeReport, Error>;
}

/// Configuration for the bounded consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// How long to wait before polling again when the queue is empty (milliseconds).
    pub poll_interval_ms: u64,

    /// Maximum time a single message handler can run (seconds).
    pub job_timeout_seconds: u64,
}

impl ConsumerConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get job timeout as Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            job_timeout_seconds: 60,
        }
    }
}

/// Consumer executing messages inline on the calling task.
#[derive(Clone)]
pub struct Worker {
    processor: MessageProcessor,
    config: ConsumerConfig,
}

struct Progress {
    handled: u64,
    failed: u64,
}

impl Worker {
    pub fn new(processor: MessageProcessor, config: ConsumerConfig) -> Self {
        Self { processor, config }
    }

    fn limit_reached(
        directive: &DrainDirective,
        progress: &Progress,
        deadline: Instant,
        memory: &mut Option<MemoryProbe>,
    ) -> Option<StopReason> {
        if let Some(limit) = directive.message_limit {
            if progress.handled + progress.failed >= limit {
                return Some(StopReason::MessageLimit);
            }
        }

        if Instant::now() >= deadline {
            return Some(StopReason::TimeLimit);
        }

        if let (Some(limit), Some(probe)) = (directive.memory_limit_bytes, memory.as_mut()) {
            if probe.exceeds(limit) {
                return Some(StopReason::MemoryLimit);
            }
        }

        None
    }

    async fn run(
        &self,
        directive: &DrainDirective,
        listener: &dyn WorkerListener,
    ) -> ConsumeReport {
        let started_at = Instant::now();
        let deadline = started_at + directive.time_limit;
        let queues = [directive.queue.clone()];
        let queue = self.processor.queue();
        let mut memory = directive.memory_limit_bytes.map(|_| MemoryProbe::new());
        let mut progress = Progress {
            handled: 0,
            failed: 0,
        };

        listener.on_worker_started(&queues).await;

        let stop_reason = loop {
            if let Some(reason) = Self::limit_reached(directive, &progress, deadline, &mut memory)
            {
                break reason;
            }

            let received = match until(deadline, queue.pop(&directive.queue)).await {
                None => break StopReason::TimeLimit,
                Some(Ok(received)) => received,
                Some(Err(e)) => {
                    tracing::warn!("Failed to receive from queue {}: {}", directive.queue, e);
                    None
                }
            };

            let is_idle = received.is_none();

            if let Some(message) = received {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let timeout = self.config.job_timeout().min(remaining);

                // The handler is bounded by the deadline, but redelivering a message it cut off
                // is one queue write that may complete past it.
                match self
                    .processor
                    .process(&directive.queue, message, timeout)
                    .await
                {
                    ProcessOutcome::Handled => progress.handled += 1,
                    ProcessOutcome::Redelivered | ProcessOutcome::Dropped => progress.failed += 1,
                }
            }

            if listener.on_worker_running(&queues, is_idle).await == WorkerControl::Stop {
                break StopReason::Listener;
            }

            if is_idle {
                let idle = tokio::time::sleep(self.config.poll_interval());
                if until(deadline, idle).await.is_none() {
                    break StopReason::TimeLimit;
                }
            }
        };

        listener.on_worker_stopped(&queues).await;

        tracing::debug!(
            "Consumer for queue {} stopped after {:?} ({:?})",
            directive.queue,
            started_at.elapsed(),
            stop_reason
        );

        ConsumeReport {
            handled: progress.handled,
            failed: progress.failed,
            stop_reason,
            elapsed: started_at.elapsed(),
        }
    }
}

/// Awaits `fut` unless `deadline` passes first.
async fn until<F: Future>(deadline: Instant, fut: F) -> Option<F::Output> {
    tokio::time::timeout_at(deadline, fut).await.ok()
}

#[async_trait]
impl BoundedConsumer for Worker {
    async fn consume(
        &self,
        directive: &DrainDirective,
        listener: &dyn WorkerListener,
    ) -> Result<ConsumeReport, Error> {
        Ok(self.run(directive, listener).await)
    }
}

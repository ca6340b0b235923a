//! Fallback scheduling policies and their defaults.
//!
//! One scheduler runs exactly one policy:
//!
//! - [`FallbackPolicy::RequestProportional`]: only queues that received messages during the
//!   unit of work are checked, and a drain handles at most the number of messages enqueued plus
//!   a small margin. Short grace period, reacts quickly to bursts.
//! - [`FallbackPolicy::FixedBudget`]: every configured queue is checked at the end of every
//!   unit of work and drained until idle, time or memory runs out. Long grace period so a
//!   single long-running job on a real worker doesn't look like a dead worker.

use std::time::Duration;

/// Grace period of a heartbeat under the request-proportional policy (60 seconds)
pub const REQUEST_PROPORTIONAL_GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Grace period of a heartbeat under the fixed-budget policy (10 minutes)
pub const FIXED_BUDGET_GRACE_PERIOD: Duration = Duration::from_secs(600);

/// Wall-clock ceiling of a single drain (30 seconds)
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Messages drained on top of those enqueued during the unit of work
pub const DEFAULT_MESSAGE_MARGIN: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    RequestProportional {
        /// Added to the unit of work's tally to get the drain's message limit
        margin: u64,
    },
    FixedBudget,
}

/// When the end-of-unit-of-work decision runs relative to the HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackHook {
    /// After the response has been handed back, in a background task.
    Terminate,
    /// Before the response is returned, adding the drain to the request's latency.
    ///
    /// Queues are drained one after another, each with its own time limit, so the added latency
    /// is bounded by the number of drained queues times `time_limit`. With the fixed-budget
    /// policy that is every configured queue without a live worker.
    Response,
}

#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub policy: FallbackPolicy,
    /// Queues managed by the fallback. Empty means "any queue" for the request-proportional
    /// policy and "no queue" for the fixed-budget policy.
    pub queues: Vec<String>,
    /// How long a heartbeat keeps a queue marked as serviced.
    pub grace_period: Duration,
    /// Wall-clock ceiling of a single drain.
    pub time_limit: Duration,
    /// Memory ceiling passed to fixed-budget drains.
    pub memory_limit_bytes: Option<u64>,
    pub hook: FallbackHook,
}

impl FallbackConfig {
    /// Request-proportional policy with a 60 second grace period, 30 second drains and a
    /// margin of one message.
    pub fn request_proportional() -> Self {
        Self {
            policy: FallbackPolicy::RequestProportional {
                margin: DEFAULT_MESSAGE_MARGIN,
            },
            queues: Vec::new(),
            grace_period: REQUEST_PROPORTIONAL_GRACE_PERIOD,
            time_limit: DEFAULT_TIME_LIMIT,
            memory_limit_bytes: None,
            hook: FallbackHook::Terminate,
        }
    }

    /// Fixed-budget policy over `queues` with a 10 minute grace period and 30 second drains.
    pub fn fixed_budget(queues: Vec<String>) -> Self {
        Self {
            policy: FallbackPolicy::FixedBudget,
            queues,
            grace_period: FIXED_BUDGET_GRACE_PERIOD,
            time_limit: DEFAULT_TIME_LIMIT,
            memory_limit_bytes: None,
            hook: FallbackHook::Terminate,
        }
    }

    /// Whether `queue` is managed by the fallback.
    ///
    /// Queues outside the configured set are silently ignored by heartbeats and drains.
    pub fn manages(&self, queue: &str) -> bool {
        match self.policy {
            FallbackPolicy::RequestProportional { .. } if self.queues.is_empty() => true,
            _ => self.queues.iter().any(|q| q == queue),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self::request_proportional()
    }
}

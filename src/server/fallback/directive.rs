use std::time::Duration;

/// Bounded instruction for one synchronous consume pass over a queue.
///
/// Built at decision time, executed once and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainDirective {
    pub queue: String,
    /// Maximum messages received, `None` leaves the drain bounded by time and memory only.
    pub message_limit: Option<u64>,
    /// Wall-clock ceiling of the drain, never zero.
    pub time_limit: Duration,
    pub memory_limit_bytes: Option<u64>,
}

impl DrainDirective {
    /// Drain limited to `tally + margin` messages, at least one.
    pub fn request_proportional(
        queue: impl Into<String>,
        tally: u64,
        margin: u64,
        time_limit: Duration,
    ) -> Self {
        Self {
            queue: queue.into(),
            message_limit: Some(tally.saturating_add(margin).max(1)),
            time_limit: nonzero(time_limit),
            memory_limit_bytes: None,
        }
    }

    /// Drain bounded only by time and, if set, memory.
    pub fn fixed_budget(
        queue: impl Into<String>,
        time_limit: Duration,
        memory_limit_bytes: Option<u64>,
    ) -> Self {
        Self {
            queue: queue.into(),
            message_limit: None,
            time_limit: nonzero(time_limit),
            memory_limit_bytes,
        }
    }

    pub fn time_limit_seconds(&self) -> u64 {
        self.time_limit.as_secs()
    }
}

fn nonzero(time_limit: Duration) -> Duration {
    if time_limit.is_zero() {
        Duration::from_secs(1)
    } else {
        time_limit
    }
}

//! Request-scoped message counter.
//!
//! Each unit of work gets its own counter, so tallies are never shared between concurrent
//! requests. Messages enqueued by jobs running inside a drain are not external demand and are
//! not counted.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use super::in_drain;

#[derive(Clone, Default)]
pub struct MessageCounter {
    tally: Arc<Mutex<HashMap<String, u64>>>,
}

impl MessageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one message enqueued to `queue`, unless called from inside a fallback drain.
    pub fn record_enqueue(&self, queue: &str) {
        if in_drain() {
            return;
        }

        let mut tally = self.tally.lock();
        *tally.entry(queue.to_string()).or_insert(0) += 1;
    }

    /// Returns the tally and resets it to empty.
    pub fn drain_tally(&self) -> HashMap<String, u64> {
        std::mem::take(&mut *self.tally.lock())
    }

    /// Current count for `queue` without resetting.
    pub fn count(&self, queue: &str) -> u64 {
        self.tally.lock().get(queue).copied().unwrap_or(0)
    }
}

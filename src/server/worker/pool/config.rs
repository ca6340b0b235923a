use std::time::Duration;

/// Configuration for the dedicated worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum concurrent messages that can be processed simultaneously.
    pub max_concurrent_jobs: usize,

    /// Number of dispatcher tasks that poll the queues for messages.
    ///
    /// Automatically calculated as 1 dispatcher per 40 concurrent jobs (minimum 1).
    /// This ensures adequate polling capacity as concurrency scales.
    pub dispatcher_count: usize,

    /// How long to wait between polls when every queue is empty (milliseconds).
    pub poll_interval_ms: u64,

    /// Maximum time a message handler can run before being cancelled (seconds).
    pub job_timeout_seconds: u64,

    /// Maximum time to wait for a dispatcher to shutdown (seconds).
    /// If a dispatcher doesn't stop within this time, a warning is logged.
    pub shutdown_timeout_seconds: u64,

    /// How often the pool reports that it is alive (milliseconds).
    /// Must stay well below the fallback grace period or drains will start alongside the pool.
    pub heartbeat_interval_ms: u64,
}

impl WorkerPoolConfig {
    /// Create a new configuration with sensible defaults
    ///
    /// # Arguments
    /// * `max_concurrent_jobs` - Maximum messages processed at the same time
    pub fn new(max_concurrent_jobs: usize) -> Self {
        let max_concurrent_jobs = max_concurrent_jobs.max(1);
        // Scale dispatchers: 1 per 40 concurrent jobs, minimum 1
        let dispatcher_count = max_concurrent_jobs.div_ceil(40).max(1);

        Self {
            max_concurrent_jobs,
            dispatcher_count,
            poll_interval_ms: 50,          // 50ms between polls when queues are empty
            job_timeout_seconds: 60,       // 1 minute
            shutdown_timeout_seconds: 5,   // 5 seconds to wait for dispatcher shutdown
            heartbeat_interval_ms: 10_000, // 10 seconds, a sixth of the shortest grace period
        }
    }

    /// Get job timeout as Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    /// Get heartbeat interval as Duration
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(4)
    }
}

//! Dedicated worker pool for processing messages with concurrency control.
//!
//! This module provides the `WorkerPool`, the "real" worker the fallback scheduler defers to.
//! It manages dispatcher tasks that poll the queues, executes messages under a semaphore-based
//! concurrency limit and reports heartbeats to its listener so that fallback drains stay off
//! while it runs.

mod config;

pub use config::WorkerPoolConfig;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::{Notify, RwLock, Semaphore};
use tokio::task::JoinHandle;

use crate::server::{
    error::Error,
    model::message::{validate_queue_name, Message},
    worker::{
        event::{WorkerControl, WorkerListener},
        processor::MessageProcessor,
    },
};

/// Dedicated worker pool consuming a fixed set of queues.
///
/// Cheap to clone, all clones control the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<WorkerPoolRef>,
}

/// Internal worker pool reference with configuration and runtime state.
pub struct WorkerPoolRef {
    config: WorkerPoolConfig,
    queues: Arc<[String]>,
    processor: MessageProcessor,
    listener: Arc<dyn WorkerListener>,
    semaphore: Arc<Semaphore>,
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    dispatcher_handles: RwLock<Vec<JoinHandle<()>>>,
    heartbeat_handle: RwLock<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a new worker pool.
    ///
    /// The pool is created in a stopped state and must be started with `start()`.
    ///
    /// # Arguments
    /// - `config` - Concurrency, polling and heartbeat settings
    /// - `queues` - Queues consumed by this pool, polled in order
    /// - `processor` - Executes received messages
    /// - `listener` - Receives lifecycle signals, usually a liveness heartbeat
    ///
    /// # Returns
    /// - `Ok(WorkerPool)` - New worker pool ready to start
    /// - `Err(Error::WorkerError)` - A queue name is invalid
    pub fn new(
        config: WorkerPoolConfig,
        queues: Vec<String>,
        processor: MessageProcessor,
        listener: Arc<dyn WorkerListener>,
    ) -> Result<Self, Error> {
        for queue in &queues {
            validate_queue_name(queue)?;
        }

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Ok(Self {
            inner: Arc::new(WorkerPoolRef {
                config,
                queues: queues.into(),
                processor,
                listener,
                semaphore,
                shutdown: Arc::new(Notify::new()),
                stopping: Arc::new(AtomicBool::new(false)),
                dispatcher_handles: RwLock::new(Vec::new()),
                heartbeat_handle: RwLock::new(None),
            }),
        })
    }

    /// Starts the worker pool.
    ///
    /// Reports the start to the listener (marking the queues alive right away), then spawns
    /// the dispatcher tasks and the heartbeat task. Non-blocking and idempotent: calling it when
    /// already running logs a warning and returns Ok.
    pub async fn start(&self) -> Result<(), Error> {
        let mut handles = self.inner.dispatcher_handles.write().await;

        if !handles.is_empty() {
            tracing::warn!("Worker pool is already running");
            return Ok(());
        }

        if self.inner.semaphore.is_closed() {
            return Err(Error::InternalError(
                "Worker pool cannot be restarted after stop, create a new pool".to_string(),
            ));
        }

        tracing::info!(
            "Starting worker pool on {:?} with {} dispatcher(s) (max {} concurrent jobs)",
            self.inner.queues,
            self.inner.config.dispatcher_count,
            self.inner.config.max_concurrent_jobs
        );

        self.inner.stopping.store(false, Ordering::SeqCst);
        self.inner.listener.on_worker_started(&self.inner.queues).await;

        for id in 0..self.inner.config.dispatcher_count {
            handles.push(self.spawn_dispatcher(id));
        }

        *self.inner.heartbeat_handle.write().await = Some(self.spawn_heartbeat());

        tracing::info!(
            "Worker pool started successfully ({} dispatcher(s) active)",
            self.inner.config.dispatcher_count
        );

        Ok(())
    }

    /// Spawns a single dispatcher task.
    ///
    /// Each dispatcher starts polling at a different queue so that with several dispatchers no
    /// queue is always served last.
    fn spawn_dispatcher(&self, id: usize) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            tracing::info!("Dispatcher {} started", id);
            let mut next_queue = id;

            loop {
                if inner.stopping.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    // Biased select ensures shutdown signal is prioritized
                    // over processing new messages, enabling faster shutdown.
                    biased;

                    _ = inner.shutdown.notified() => {
                        tracing::debug!("Dispatcher {} received shutdown signal", id);
                        break;
                    }

                    _ = Self::process_next(id, &inner, &mut next_queue) => {}
                }
            }

            tracing::info!("Dispatcher {} stopped", id);
        })
    }

    /// Polls the queues once and spawns a task for the first ready message.
    ///
    /// Sleeps if every queue is empty or on error. Returns the message to its queue if the
    /// semaphore is closed (shutting down).
    async fn process_next(dispatcher_id: usize, inner: &Arc<WorkerPoolRef>, next_queue: &mut usize) {
        let queue_count = inner.queues.len();

        for offset in 0..queue_count {
            let queue_name = &inner.queues[(*next_queue + offset) % queue_count];

            match inner.processor.queue().pop(queue_name).await {
                Ok(Some(message)) => {
                    *next_queue = (*next_queue + offset + 1) % queue_count;
                    Self::dispatch(dispatcher_id, inner, queue_name.clone(), message).await;
                    return;
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(
                        "Dispatcher {} queue {} error: {}",
                        dispatcher_id,
                        queue_name,
                        e
                    );
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    return;
                }
            }
        }

        // Every queue is empty, sleep before next poll
        tokio::time::sleep(inner.config.poll_interval()).await;
    }

    async fn dispatch(
        dispatcher_id: usize,
        inner: &Arc<WorkerPoolRef>,
        queue_name: String,
        message: Message,
    ) {
        // Blocks if at capacity
        match inner.semaphore.clone().acquire_owned().await {
            Ok(permit) => {
                let processor = inner.processor.clone();
                let timeout = inner.config.job_timeout();

                tokio::spawn(async move {
                    processor.process(&queue_name, message, timeout).await;
                    drop(permit);
                });
            }
            Err(_) => {
                // Semaphore closed (shutting down), push message back
                if let Err(e) = inner.processor.queue().push(&queue_name, &message).await {
                    tracing::error!("Failed to return {} to {}: {}", message, queue_name, e);
                }
                tracing::debug!(
                    "Dispatcher {} semaphore closed, returned message to queue",
                    dispatcher_id
                );
            }
        }
    }

    /// Spawns the task reporting liveness every heartbeat interval.
    ///
    /// A `Stop` answer from the listener stops dispatching, in-flight messages still complete.
    fn spawn_heartbeat(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.config.heartbeat_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately, start() already reported in
            interval.tick().await;

            loop {
                interval.tick().await;

                let is_idle =
                    inner.semaphore.available_permits() == inner.config.max_concurrent_jobs;

                if inner.listener.on_worker_running(&inner.queues, is_idle).await
                    == WorkerControl::Stop
                {
                    tracing::info!("Worker listener requested stop, dispatchers shutting down");
                    inner.stopping.store(true, Ordering::SeqCst);
                    inner.shutdown.notify_waiters();
                    break;
                }
            }
        })
    }

    /// Stops the worker pool gracefully.
    ///
    /// Signals all dispatchers to stop, closes the semaphore to prevent new messages from
    /// starting and waits for all dispatchers to shut down with a configured timeout. In-flight
    /// message tasks continue to completion. Idempotent.
    ///
    /// # Note
    /// Call this method before dropping the WorkerPool to ensure clean shutdown.
    pub async fn stop(&self) -> Result<(), Error> {
        if !self.is_running().await {
            tracing::debug!("Worker pool is already stopped");
            return Ok(());
        }

        tracing::info!("Shutting down worker pool...");

        self.inner.semaphore.close();
        self.inner.stopping.store(true, Ordering::SeqCst);
        self.inner.shutdown.notify_waiters();

        if let Some(heartbeat) = self.inner.heartbeat_handle.write().await.take() {
            heartbeat.abort();
        }

        let mut handles = self.inner.dispatcher_handles.write().await;
        let dispatcher_count = handles.len();

        for (i, handle) in handles.drain(..).enumerate() {
            match tokio::time::timeout(self.inner.config.shutdown_timeout(), handle).await {
                Ok(Ok(())) => tracing::debug!("Dispatcher {} stopped cleanly", i),
                Ok(Err(e)) => tracing::error!("Dispatcher {} panicked: {:?}", i, e),
                Err(_) => tracing::warn!("Dispatcher {} did not stop within timeout", i),
            }
        }

        self.inner.listener.on_worker_stopped(&self.inner.queues).await;

        tracing::info!(
            "Worker pool shut down ({} dispatchers stopped, in-flight tasks will complete)",
            dispatcher_count
        );

        Ok(())
    }

    /// Checks if the worker pool has active dispatchers.
    pub async fn is_running(&self) -> bool {
        !self.inner.dispatcher_handles.read().await.is_empty()
    }

    /// Gets the number of active dispatchers.
    pub async fn dispatcher_count(&self) -> usize {
        self.inner.dispatcher_handles.read().await.len()
    }

    /// Queues consumed by this pool
    pub fn queues(&self) -> &[String] {
        &self.inner.queues
    }

    /// Gets the current number of messages being processed.
    ///
    /// This is calculated as: max_concurrent_jobs - available_permits
    pub fn active_job_count(&self) -> usize {
        self.inner.config.max_concurrent_jobs - self.inner.semaphore.available_permits()
    }
}

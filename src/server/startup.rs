use std::sync::Arc;

use crate::server::{
    config::Config,
    error::Error,
    fallback::{cache::RedisCache, FallbackScheduler, Heartbeat, LivenessTracker},
    model::app::AppState,
    worker::{
        handler::{HandlerRegistry, LogHandler},
        pool::WorkerPoolConfig,
        processor::{MessageProcessor, RetryPolicy},
        queue::RedisMessageQueue,
        ConsumerConfig, MessageBus, MessageQueue, Worker, WorkerPool,
    },
};

/// Connect to Valkey/Redis, used for both queues and liveness markers
pub async fn connect_to_valkey(config: &Config) -> Result<fred::prelude::Pool, Error> {
    use fred::prelude::*;

    let redis_config = Config::from_url(&config.valkey_url)?;
    let pool = Pool::new(redis_config, None, None, None, 6)?;

    pool.connect();
    pool.wait_for_connect().await?;

    Ok(pool)
}

/// Message handlers known to this deployment
pub fn build_handlers() -> HandlerRegistry {
    HandlerRegistry::new().register("log", Arc::new(LogHandler))
}

fn build_processor(pool: &fred::prelude::Pool, handlers: Arc<HandlerRegistry>) -> MessageProcessor {
    let queue: Arc<dyn MessageQueue> = Arc::new(RedisMessageQueue::new(pool.clone()));

    MessageProcessor::new(queue, handlers, RetryPolicy::default())
}

/// Build the state shared by HTTP handlers, including the fallback scheduler
pub fn build_app_state(
    config: &Config,
    pool: &fred::prelude::Pool,
    handlers: Arc<HandlerRegistry>,
) -> AppState {
    let processor = build_processor(pool, handlers.clone());
    let bus = MessageBus::new(processor.queue().clone());
    let consumer = Worker::new(processor, ConsumerConfig::default());
    let liveness = LivenessTracker::new(Arc::new(RedisCache::new(pool.clone())));

    let scheduler = FallbackScheduler::new(config.fallback.clone(), liveness, Arc::new(consumer));

    AppState {
        scheduler: Arc::new(scheduler),
        bus,
        handlers,
    }
}

/// Build and start the dedicated worker pool
///
/// The pool reports heartbeats for its queues so that fallback drains in `serve` processes stay
/// off while it runs.
pub async fn start_worker_pool(
    config: &Config,
    pool: &fred::prelude::Pool,
    handlers: Arc<HandlerRegistry>,
) -> Result<WorkerPool, Error> {
    let processor = build_processor(pool, handlers);
    let liveness = LivenessTracker::new(Arc::new(RedisCache::new(pool.clone())));
    let heartbeat = Heartbeat::new(liveness, config.fallback.clone());

    let worker_pool = WorkerPool::new(
        WorkerPoolConfig::new(config.worker_max_concurrent_jobs),
        config.worker_queues.clone(),
        processor,
        Arc::new(heartbeat),
    )?;

    worker_pool.start().await?;

    Ok(worker_pool)
}

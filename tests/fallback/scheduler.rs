use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
    time::Duration,
};

use async_trait::async_trait;
use ferry::server::{
    error::Error,
    fallback::{
        cache::ExpiringCache, FallbackConfig, FallbackPolicy, FallbackScheduler, LivenessTracker,
    },
    model::message::Message,
    worker::{
        event::{WorkerControl, WorkerListener},
        handler::MessageHandler,
    },
};
use parking_lot::Mutex;

use crate::util::{FailingConsumer, PanickingConsumer, RecordingConsumer, TestContext, RECORD};

struct UnreachableCache;

#[async_trait]
impl ExpiringCache for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::InternalError("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), Error> {
        Err(Error::InternalError("connection refused".to_string()))
    }
}

/// Ends a unit of work from inside the job being drained and records how many drains it
/// triggered.
#[derive(Default)]
struct NestedUnitOfWorkHandler {
    scheduler: OnceLock<Arc<FallbackScheduler>>,
    nested_outcomes: Mutex<Vec<usize>>,
}

#[async_trait]
impl MessageHandler for NestedUnitOfWorkHandler {
    async fn handle(&self, _message: &Message) -> Result<(), Error> {
        if let Some(scheduler) = self.scheduler.get() {
            let counter = scheduler.begin_unit_of_work();
            counter.record_enqueue("orders");
            let outcomes = scheduler.on_unit_of_work_end(&counter).await;
            self.nested_outcomes.lock().push(outcomes.len());
        }
        Ok(())
    }
}

#[tokio::test]
async fn plan_orders_queues_by_name_and_skips_empty_counts() {
    let ctx = TestContext::new();
    let scheduler = ctx.scheduler(FallbackConfig::request_proportional());

    let tally = HashMap::from([
        ("orders".to_string(), 2),
        ("emails".to_string(), 1),
        ("reports".to_string(), 0),
    ]);
    let plan = scheduler.plan(&tally);

    let queues: Vec<&str> = plan.iter().map(|d| d.queue.as_str()).collect();
    assert_eq!(queues, vec!["emails", "orders"]);
    assert_eq!(plan[0].message_limit, Some(2));
    assert_eq!(plan[1].message_limit, Some(3));
}

#[tokio::test]
async fn plan_applies_margin() {
    let ctx = TestContext::new();
    let mut config = FallbackConfig::request_proportional();
    config.policy = FallbackPolicy::RequestProportional { margin: 5 };
    let scheduler = ctx.scheduler(config);

    let plan = scheduler.plan(&HashMap::from([("orders".to_string(), 1)]));

    assert_eq!(plan[0].message_limit, Some(6));
}

#[tokio::test]
async fn request_proportional_respects_allow_list() {
    let ctx = TestContext::new();
    let consumer = Arc::new(RecordingConsumer::default());
    let mut config = FallbackConfig::request_proportional();
    config.queues = vec!["orders".to_string()];
    let scheduler = ctx.scheduler_with_consumer(config, consumer.clone());

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    counter.record_enqueue("emails");
    scheduler.on_unit_of_work_end(&counter).await;

    let queues: Vec<String> = consumer.directives().into_iter().map(|d| d.queue).collect();
    assert_eq!(queues, vec!["orders"]);
}

#[tokio::test]
async fn request_proportional_without_enqueues_does_nothing() {
    let ctx = TestContext::new();
    let consumer = Arc::new(RecordingConsumer::default());
    let scheduler =
        ctx.scheduler_with_consumer(FallbackConfig::request_proportional(), consumer.clone());

    let counter = scheduler.begin_unit_of_work();
    let outcomes = scheduler.on_unit_of_work_end(&counter).await;

    assert!(outcomes.is_empty());
    assert!(consumer.directives().is_empty());
}

#[tokio::test]
async fn fixed_budget_checks_every_configured_queue() {
    let ctx = TestContext::new();
    let consumer = Arc::new(RecordingConsumer::default());
    let config = FallbackConfig::fixed_budget(vec!["reports".to_string(), "emails".to_string()]);
    let scheduler = ctx.scheduler_with_consumer(config, consumer.clone());

    ctx.liveness
        .ping("reports", Duration::from_secs(600))
        .await
        .expect("Failed to ping");

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    scheduler.on_unit_of_work_end(&counter).await;

    let queues: Vec<String> = consumer.directives().into_iter().map(|d| d.queue).collect();
    assert_eq!(queues, vec!["emails"]);
}

#[tokio::test]
async fn tally_is_consumed_exactly_once() {
    let ctx = TestContext::new();
    let consumer = Arc::new(RecordingConsumer::default());
    let scheduler =
        ctx.scheduler_with_consumer(FallbackConfig::request_proportional(), consumer.clone());

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    scheduler.on_unit_of_work_end(&counter).await;
    scheduler.on_unit_of_work_end(&counter).await;

    assert_eq!(consumer.directives().len(), 1);
}

#[tokio::test]
async fn unreachable_liveness_store_drains() {
    let consumer = Arc::new(RecordingConsumer::default());
    let scheduler = Arc::new(FallbackScheduler::new(
        FallbackConfig::request_proportional(),
        LivenessTracker::new(Arc::new(UnreachableCache)),
        consumer.clone(),
    ));

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    let outcomes = scheduler.on_unit_of_work_end(&counter).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(consumer.directives()[0].queue, "orders");
}

#[tokio::test]
async fn consumer_failure_is_reported_and_ends_drain() {
    let ctx = TestContext::new();
    let scheduler =
        ctx.scheduler_with_consumer(FallbackConfig::request_proportional(), Arc::new(FailingConsumer));

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    let outcomes = scheduler.on_unit_of_work_end(&counter).await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].report.is_none());
    assert!(!scheduler.is_fallback_running());
}

#[tokio::test]
async fn consumer_panic_does_not_leave_drain_running() {
    let ctx = TestContext::new();
    let scheduler = ctx.scheduler_with_consumer(
        FallbackConfig::request_proportional(),
        Arc::new(PanickingConsumer),
    );

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");

    let task_scheduler = scheduler.clone();
    let result =
        tokio::spawn(async move { task_scheduler.on_unit_of_work_end(&counter).await }).await;

    assert!(result.is_err(), "Drain should have panicked");
    assert!(!scheduler.is_fallback_running());

    let counter = scheduler.begin_unit_of_work();
    counter.record_enqueue("orders");
    assert_eq!(counter.count("orders"), 1);
}

#[tokio::test]
async fn nested_unit_of_work_end_is_skipped_during_drain() {
    let nested = Arc::new(NestedUnitOfWorkHandler::default());
    let ctx = TestContext::new().with_handler("nested", nested.clone());
    let scheduler = ctx.scheduler(FallbackConfig::request_proportional());
    let _ = nested.scheduler.set(scheduler.clone());

    let counter = scheduler.begin_unit_of_work();
    ctx.enqueue(&counter, "orders", "nested", 1).await;
    let outcomes = scheduler.on_unit_of_work_end(&counter).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(*nested.nested_outcomes.lock(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn worker_signals_outside_drain_refresh_liveness() {
    let ctx = TestContext::new();
    let scheduler = ctx.scheduler(FallbackConfig::request_proportional());
    let queues = ["orders".to_string()];

    scheduler.on_worker_started(&queues).await;
    assert!(ctx.liveness.is_alive("orders").await);

    tokio::time::advance(Duration::from_secs(50)).await;
    let control = scheduler.on_worker_running(&queues, true).await;
    assert_eq!(control, WorkerControl::Continue);

    tokio::time::advance(Duration::from_secs(50)).await;
    assert!(ctx.liveness.is_alive("orders").await);

    scheduler.on_worker_stopped(&queues).await;
    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(!ctx.liveness.is_alive("orders").await);
}

#[tokio::test(start_paused = true)]
async fn worker_signals_for_unmanaged_queues_are_ignored() {
    let ctx = TestContext::new();
    let scheduler = ctx.scheduler(FallbackConfig::fixed_budget(vec!["reports".to_string()]));

    scheduler
        .on_worker_started(&["orders".to_string(), "reports".to_string()])
        .await;

    assert!(!ctx.liveness.is_alive("orders").await);
    assert!(ctx.liveness.is_alive("reports").await);
}

#[tokio::test]
async fn drained_messages_are_handled() {
    let ctx = TestContext::new();
    let scheduler = ctx.scheduler(FallbackConfig::request_proportional());

    let counter = scheduler.begin_unit_of_work();
    ctx.enqueue(&counter, "orders", RECORD, 2).await;
    ctx.seed("orders", RECORD, 5).await;
    let outcomes = scheduler.on_unit_of_work_end(&counter).await;

    let report = outcomes[0].report.clone().expect("Drain should report");
    assert_eq!(report.handled, 3);
    assert_eq!(ctx.handled.count(), 3);
    assert_eq!(ctx.pending("orders").await, 4);
}

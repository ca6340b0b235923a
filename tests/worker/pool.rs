//! Tests for the dedicated worker pool.
//!
//! This module verifies pool lifecycle transitions, message processing across queues and the
//! heartbeats that keep fallback drains off while the pool runs.

use std::{sync::Arc, time::Duration};

use ferry::server::{
    fallback::{FallbackConfig, Heartbeat},
    worker::{pool::WorkerPoolConfig, WorkerPool},
};

use crate::util::{TestContext, RECORD};

fn create_test_pool(ctx: &TestContext, queues: &[&str], config: WorkerPoolConfig) -> WorkerPool {
    let heartbeat = Heartbeat::new(ctx.liveness.clone(), FallbackConfig::request_proportional());

    WorkerPool::new(
        config,
        queues.iter().map(|q| q.to_string()).collect(),
        ctx.processor(),
        Arc::new(heartbeat),
    )
    .expect("Failed to create pool")
}

async fn wait_for_handled(ctx: &TestContext, expected: usize) {
    for _ in 0..200 {
        if ctx.handled.count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!(
        "Expected {} handled messages, got {}",
        expected,
        ctx.handled.count()
    );
}

/// Tests pool startup and shutdown.
///
/// Expected: running with one dispatcher after start, stopped after stop
#[tokio::test]
async fn starts_and_stops() {
    let ctx = TestContext::new();
    let pool = create_test_pool(&ctx, &["orders"], WorkerPoolConfig::new(4));

    assert!(!pool.is_running().await);
    assert_eq!(pool.dispatcher_count().await, 0);

    pool.start().await.expect("Failed to start pool");
    assert!(pool.is_running().await);
    assert_eq!(pool.dispatcher_count().await, 1);

    pool.stop().await.expect("Failed to stop pool");
    assert!(!pool.is_running().await);
}

/// Tests that start operation is idempotent.
///
/// Expected: second start succeeds without adding dispatchers
#[tokio::test]
async fn start_is_idempotent() {
    let ctx = TestContext::new();
    let pool = create_test_pool(&ctx, &["orders"], WorkerPoolConfig::new(4));

    pool.start().await.expect("Failed to start pool");
    pool.start().await.expect("Second start should succeed");
    assert_eq!(pool.dispatcher_count().await, 1);

    pool.stop().await.expect("Failed to stop pool");
    pool.stop().await.expect("Second stop should succeed");
}

/// Tests that a stopped pool refuses to start again.
///
/// Expected: start() after stop() returns an error
#[tokio::test]
async fn cannot_restart_after_stop() {
    let ctx = TestContext::new();
    let pool = create_test_pool(&ctx, &["orders"], WorkerPoolConfig::new(1));

    pool.start().await.expect("Failed to start pool");
    pool.stop().await.expect("Failed to stop pool");

    assert!(pool.start().await.is_err());
}

/// Tests that invalid queue names are rejected at construction.
///
/// Expected: WorkerPool::new returns an error
#[tokio::test]
async fn rejects_invalid_queue_names() {
    let ctx = TestContext::new();
    let heartbeat = Heartbeat::new(ctx.liveness.clone(), FallbackConfig::request_proportional());

    let result = WorkerPool::new(
        WorkerPoolConfig::new(1),
        vec!["bad queue".to_string()],
        ctx.processor(),
        Arc::new(heartbeat),
    );

    assert!(result.is_err());
}

/// Tests message processing across every configured queue.
///
/// Expected: all messages handled, queues empty
#[tokio::test]
async fn processes_messages_from_all_queues() {
    let ctx = TestContext::new();
    ctx.seed("orders", RECORD, 3).await;
    ctx.seed("emails", RECORD, 2).await;
    let pool = create_test_pool(&ctx, &["orders", "emails"], WorkerPoolConfig::new(2));

    pool.start().await.expect("Failed to start pool");
    wait_for_handled(&ctx, 5).await;
    pool.stop().await.expect("Failed to stop pool");

    assert_eq!(ctx.pending("orders").await, 0);
    assert_eq!(ctx.pending("emails").await, 0);
}

/// Tests that a running pool marks its queues alive and keeps them alive past the grace period.
///
/// Expected: alive right after start and after 2 minutes, expired a grace period after stop
#[tokio::test(start_paused = true)]
async fn heartbeats_keep_queues_alive() {
    let ctx = TestContext::new();
    let pool = create_test_pool(&ctx, &["orders"], WorkerPoolConfig::new(1));

    pool.start().await.expect("Failed to start pool");
    assert!(ctx.liveness.is_alive("orders").await);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(ctx.liveness.is_alive("orders").await);

    pool.stop().await.expect("Failed to stop pool");
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!ctx.liveness.is_alive("orders").await);
}

/// Tests that active job count reflects in-flight messages.
///
/// Expected: zero before start and after everything is handled
#[tokio::test]
async fn active_job_count_returns_to_zero() {
    let ctx = TestContext::new();
    ctx.seed("orders", RECORD, 2).await;
    let pool = create_test_pool(&ctx, &["orders"], WorkerPoolConfig::new(2));

    assert_eq!(pool.active_job_count(), 0);

    pool.start().await.expect("Failed to start pool");
    wait_for_handled(&ctx, 2).await;
    for _ in 0..100 {
        if pool.active_job_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(pool.active_job_count(), 0);

    pool.stop().await.expect("Failed to stop pool");
}

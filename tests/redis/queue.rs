use chrono::Duration;
use ferry::server::{
    model::message::Message,
    worker::{
        queue::{MessageQueueConfig, RedisMessageQueue},
        MessageQueue,
    },
};
use ferry_test_utils::RedisTest;
use serde_json::json;

fn setup_test_queue(redis: &RedisTest) -> RedisMessageQueue {
    RedisMessageQueue::with_config(
        redis.redis_pool.clone(),
        MessageQueueConfig {
            key_prefix: redis.key("queue"),
        },
    )
}

#[tokio::test]
async fn push_then_pop() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let queue = setup_test_queue(&redis);
    let message = Message::new("record", json!({ "order_id": 7 }));

    queue.push("orders", &message).await.expect("Push should succeed");
    assert_eq!(queue.len("orders").await.expect("Len should succeed"), 1);

    let popped = queue.pop("orders").await.expect("Pop should succeed");
    assert_eq!(popped, Some(message));
    assert!(queue.is_empty("orders").await.expect("Len should succeed"));

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

#[tokio::test]
async fn pop_returns_earliest_available_first() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let queue = setup_test_queue(&redis);
    let later = Message::new("record", json!({ "n": 2 }));
    let earlier = Message::new("record", json!({ "n": 1 })).with_delay(Duration::seconds(-5));

    queue.push("orders", &later).await.expect("Push should succeed");
    queue.push("orders", &earlier).await.expect("Push should succeed");

    let first = queue.pop("orders").await.expect("Pop should succeed");
    assert_eq!(first.map(|m| m.id), Some(earlier.id));

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

#[tokio::test]
async fn delayed_message_is_not_popped() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let queue = setup_test_queue(&redis);
    let message = Message::new("record", json!({})).with_delay(Duration::seconds(60));

    queue.push("orders", &message).await.expect("Push should succeed");

    assert_eq!(queue.pop("orders").await.expect("Pop should succeed"), None);
    assert_eq!(queue.len("orders").await.expect("Len should succeed"), 1);

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

#[tokio::test]
async fn queues_are_isolated() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let queue = setup_test_queue(&redis);

    queue
        .push("orders", &Message::new("record", json!({})))
        .await
        .expect("Push should succeed");

    assert_eq!(queue.pop("emails").await.expect("Pop should succeed"), None);
    assert_eq!(queue.len("orders").await.expect("Len should succeed"), 1);

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

use std::{sync::Arc, time::Duration};

use ferry::server::fallback::{
    cache::{ExpiringCache, RedisCache},
    LivenessTracker,
};
use ferry_test_utils::RedisTest;

#[tokio::test]
async fn set_then_get() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let cache = RedisCache::new(redis.redis_pool.clone());
    let key = redis.key("marker");

    cache
        .set(&key, "1", Duration::from_secs(60))
        .await
        .expect("Set should succeed");

    assert_eq!(
        cache.get(&key).await.expect("Get should succeed"),
        Some("1".to_string())
    );

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

#[tokio::test]
async fn value_expires_after_ttl() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let cache = RedisCache::new(redis.redis_pool.clone());
    let key = redis.key("marker");

    cache
        .set(&key, "1", Duration::from_millis(100))
        .await
        .expect("Set should succeed");
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(cache.get(&key).await.expect("Get should succeed"), None);

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

#[tokio::test]
async fn liveness_round_trip() {
    let redis = RedisTest::new().await.expect("Failed to create Redis test");
    let liveness = LivenessTracker::with_key_prefix(
        Arc::new(RedisCache::new(redis.redis_pool.clone())),
        redis.key("alive"),
    );

    assert!(!liveness.is_alive("orders").await);

    liveness
        .ping("orders", Duration::from_secs(60))
        .await
        .expect("Ping should succeed");

    assert!(liveness.is_alive("orders").await);
    assert!(!liveness.is_alive("emails").await);

    redis.cleanup().await.expect("Failed to cleanup Redis");
}

mod fixtures;

use fixtures::sample_order;
use order_lookup::{
    config::AppConfig,
    db::{self, queries::PgOrderRepository, OrderRepository, RepositoryError},
    services::{
        cache::OrderCache,
        ingest::{self, IngestOutcome},
        orders::OrderService,
        queue::{DeadLetter, DeadLetterReason, OrderQueue},
    },
};
use redis::AsyncCommands;
use std::sync::Arc;

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

/// Integration test: PostgreSQL repository
///
/// Requires a running PostgreSQL instance configured via environment
/// variables (DATABASE_URL, REDIS_URL).
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_postgres_repository_roundtrip() {
    let config = AppConfig::from_env().expect("Failed to load config");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");
    let repo = PgOrderRepository::new(db_pool);

    repo.ping().await.expect("ping failed");

    // 1. Save and read back
    let uid = unique("it-order");
    let mut order = sample_order(&uid);
    repo.save_order(&order).await.expect("Failed to save order");

    let stored = repo
        .get_order_by_uid(&uid)
        .await
        .expect("Failed to load order");
    assert_eq!(stored, order);

    // 2. Saving again replaces the items instead of duplicating them
    order.items[0].name = "Replaced".to_string();
    repo.save_order(&order).await.expect("Failed to resave order");
    let stored = repo.get_order_by_uid(&uid).await.unwrap();
    assert_eq!(stored.items.len(), order.items.len());
    assert_eq!(stored.items[0].name, "Replaced");

    // 3. Newest orders come first
    let mut newer = sample_order(&unique("it-newer"));
    newer.date_created = chrono::Utc::now();
    repo.save_order(&newer).await.unwrap();
    let recent = repo.get_last_n_orders(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].order_uid, newer.order_uid);

    // 4. Unknown order
    let missing = repo.get_order_by_uid("it-does-not-exist").await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));
}

/// Integration test: queue -> ingest -> storage -> acknowledgement
#[tokio::test]
#[ignore]
async fn test_ingest_flow() {
    let config = AppConfig::from_env().expect("Failed to load config");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool).await.unwrap();
    let service = OrderService::new(
        Arc::new(PgOrderRepository::new(db_pool)),
        OrderCache::new(10),
    );

    let queue_key = unique("it-orders");
    let dlq_key = format!("{}.dlq", queue_key);
    let queue = OrderQueue::new(&config.redis_url, &queue_key, &dlq_key)
        .expect("Failed to initialize queue");
    queue.health_check().await.expect("Redis unavailable");

    // 1. A valid order is stored and acknowledged
    let uid = unique("it-ingest");
    let payload = serde_json::to_string(&sample_order(&uid)).unwrap();
    queue.publish(&payload).await.unwrap();
    assert_eq!(queue.queue_depth().await.unwrap(), 1);

    let fetched = queue.fetch().await.unwrap().expect("No message in queue");
    assert_eq!(fetched, payload);
    let outcome = ingest::process_message(&service, &queue, queue.queue_key(), &fetched)
        .await
        .expect("ingest failed");
    assert_eq!(outcome, IngestOutcome::Stored { order_uid: uid.clone() });
    queue.ack(&fetched).await.unwrap();

    let stored = service.get_order_by_uid(&uid).await.unwrap();
    assert_eq!(stored.order_uid, uid);
    assert_eq!(queue.recover_in_flight().await.unwrap(), 0);

    // 2. Garbage is dead-lettered with its reason
    queue.publish("{not json").await.unwrap();
    let fetched = queue.fetch().await.unwrap().unwrap();
    let outcome = ingest::process_message(&service, &queue, queue.queue_key(), &fetched)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        IngestOutcome::DeadLettered(DeadLetterReason::JsonUnmarshalFailed)
    );
    queue.ack(&fetched).await.unwrap();

    let client = redis::Client::open(config.redis_url.as_str()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let entry: Option<String> = conn.rpop(&dlq_key, None).await.unwrap();
    let letter: DeadLetter = serde_json::from_str(&entry.expect("empty DLQ")).unwrap();
    assert_eq!(letter.payload, "{not json");
    assert_eq!(letter.error_reason, DeadLetterReason::JsonUnmarshalFailed);
    assert_eq!(letter.original_queue, queue_key);

    // 3. An unacknowledged message is recovered after a crash
    queue.publish(&payload).await.unwrap();
    queue.fetch().await.unwrap().unwrap();
    assert_eq!(queue.recover_in_flight().await.unwrap(), 1);
    assert_eq!(queue.queue_depth().await.unwrap(), 1);

    // Cleanup
    conn.del::<_, ()>(&[
        queue_key.clone(),
        format!("{}:processing", queue_key),
        dlq_key,
    ])
    .await
    .unwrap();
}

use order_lookup::{
    config::AppConfig,
    db::{self, queries::PgOrderRepository},
    services::{
        cache::OrderCache,
        ingest::{self, IngestOutcome},
        orders::OrderService,
        queue::OrderQueue,
    },
    shutdown::shutdown_signal,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 500;
const ERROR_BACKOFF_MS: u64 = 2000;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting order ingestion worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let metrics_addr: SocketAddr = config
        .worker_metrics_addr
        .parse()
        .expect("Invalid WORKER_METRICS_ADDR");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("Failed to install Prometheus exporter");
    order_lookup::routes::metrics::describe();
    tracing::info!(%metrics_addr, "Serving worker metrics");

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // The worker only writes through the service; a tiny cache suffices.
    let repo = Arc::new(PgOrderRepository::new(db_pool));
    let service = OrderService::new(repo, OrderCache::new(1));

    let queue = OrderQueue::new(
        &config.redis_url,
        &config.ingest_queue,
        &config.dead_letter_queue,
    )
    .expect("Failed to initialize ingestion queue");

    match queue.recover_in_flight().await {
        Ok(0) => {}
        Ok(n) => tracing::warn!(recovered = n, "Requeued messages left in flight by a previous run"),
        Err(e) => tracing::error!(error = %e, "Failed to recover in-flight messages"),
    }

    tracing::info!(queue = %config.ingest_queue, "Worker ready, consuming orders");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Worker stopping");
                break;
            }
            result = process_next_message(&queue, &service) => match result {
                Ok(true) => tracing::trace!("Message handled, checking for next"),
                Ok(false) => sleep(Duration::from_millis(POLL_INTERVAL_MS)).await,
                Err(e) => {
                    tracing::error!(error = %e, "Error consuming queue, backing off");
                    sleep(Duration::from_millis(ERROR_BACKOFF_MS)).await;
                }
            }
        }
    }
}

/// Handle the next queued message.
/// Returns Ok(true) if a message was taken, Ok(false) if the queue was empty.
async fn process_next_message(
    queue: &OrderQueue,
    service: &OrderService,
) -> Result<bool, Box<dyn std::error::Error>> {
    let payload = match queue.fetch().await? {
        Some(p) => p,
        None => return Ok(false),
    };

    let start = std::time::Instant::now();
    match ingest::process_message(service, queue, queue.queue_key(), &payload).await {
        Ok(IngestOutcome::Stored { order_uid }) => {
            queue.ack(&payload).await?;
            tracing::info!(order_uid = %order_uid, "Order ingested");
        }
        Ok(IngestOutcome::DeadLettered(reason)) => {
            queue.ack(&payload).await?;
            tracing::warn!(reason = %reason, "Message moved to dead-letter queue");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to process message, will retry");
            queue.requeue(&payload).await?;
            sleep(Duration::from_millis(ERROR_BACKOFF_MS)).await;
        }
    }
    metrics::histogram!("order_ingest_seconds").record(start.elapsed().as_secs_f64());

    Ok(true)
}

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use order_lookup::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries::PgOrderRepository},
    routes,
    services::{cache::OrderCache, orders::OrderService, queue::OrderQueue},
    shutdown,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing order-lookup server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let repo = Arc::new(PgOrderRepository::new(db_pool));
    let orders = OrderService::new(repo, OrderCache::new(config.cache_capacity));

    // A cold cache is still a working cache; keep serving if preload fails.
    if let Err(e) = orders.preload_cache(config.cache_preload_limit).await {
        tracing::error!(error = %e, "Failed to preload order cache");
    }

    let queue = OrderQueue::new(
        &config.redis_url,
        &config.ingest_queue,
        &config.dead_letter_queue,
    )
    .expect("Failed to initialize ingestion queue client");

    let state = AppState::new(orders, queue);

    let app = routes::app(state, Duration::from_secs(config.http_timeout_secs)).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    let shutdown = shutdown::shutdown_signal();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutting down...");
        })
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

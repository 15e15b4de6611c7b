use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Prometheus scrape endpoint, text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Describe the metrics emitted by the service and worker.
pub fn describe() {
    metrics::describe_counter!(
        "order_lookups_total",
        "Order lookups by source (cache, repository, not_found)"
    );
    metrics::describe_counter!("orders_saved_total", "Orders persisted by the ingestion path");
    metrics::describe_counter!("orders_ingested_total", "Queue messages stored as orders");
    metrics::describe_counter!(
        "orders_dead_lettered_total",
        "Queue messages moved to the dead-letter queue"
    );
    metrics::describe_histogram!(
        "order_ingest_seconds",
        "Time to handle one ingestion queue message"
    );
}

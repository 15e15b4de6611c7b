use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod health;
pub mod metrics;
pub mod order;

/// Build the service router: lookup page, order API and health check.
///
/// `/metrics` is mounted by the binary since it needs the recorder handle.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Static lookup page (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        .route("/health", get(health::health_check))
        .route("/order/", get(order::missing_order_uid))
        .route("/order/{order_uid}", get(order::get_order_by_uid))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
}

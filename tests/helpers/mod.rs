//! Test helper utilities: in-memory application state and a live server
#![allow(dead_code)]

use axum::Router;
use order_lookup::{
    app_state::AppState,
    db::{memory::MemoryOrderRepository, OrderRepository},
    routes,
    services::{cache::OrderCache, orders::OrderService, queue::OrderQueue},
};
use std::sync::Arc;
use std::time::Duration;

/// Nothing listens here, so Redis health probes fail fast.
pub const UNREACHABLE_REDIS: &str = "redis://127.0.0.1:1";

/// Application state over an in-memory repository.
pub fn memory_state() -> (Arc<MemoryOrderRepository>, AppState) {
    let repo = Arc::new(MemoryOrderRepository::new());
    let state = state_with_repo(repo.clone());
    (repo, state)
}

/// Application state over any repository.
pub fn state_with_repo(repo: Arc<dyn OrderRepository>) -> AppState {
    let orders = OrderService::new(repo, OrderCache::new(100));
    let queue = OrderQueue::new(UNREACHABLE_REDIS, "orders-test", "orders-test.dlq")
        .expect("queue client");
    AppState::new(orders, queue)
}

pub fn app(state: AppState) -> Router {
    routes::app(state, Duration::from_secs(5))
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{}", addr)
}

use std::sync::Arc;

use crate::services::{orders::OrderService, queue::OrderQueue};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub queue: Arc<OrderQueue>,
}

impl AppState {
    pub fn new(orders: OrderService, queue: OrderQueue) -> Self {
        Self {
            orders: Arc::new(orders),
            queue: Arc::new(queue),
        }
    }
}

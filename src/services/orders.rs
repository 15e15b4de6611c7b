use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::Order;
use crate::services::cache::OrderCache;

/// Read-through cached access to orders, plus the write path used by
/// ingestion.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: OrderCache,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, cache: OrderCache) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    /// Persist a freshly ingested order, then make it visible in the cache.
    /// Nothing is cached when the save fails.
    pub async fn process_new_order(&self, order: Order) -> Result<(), OrderServiceError> {
        info!(order_uid = %order.order_uid, "Saving new order");

        if let Err(e) = self.repo.save_order(&order).await {
            error!(order_uid = %order.order_uid, error = %e, "Failed to save order");
            return Err(OrderServiceError::Repository(e));
        }

        let order_uid = order.order_uid.clone();
        self.cache.set(Arc::new(order));
        metrics::counter!("orders_saved_total").increment(1);
        info!(order_uid = %order_uid, "Order saved and cached");

        Ok(())
    }

    /// Look an order up in the cache, falling back to the repository and
    /// filling the cache on a repository hit.
    pub async fn get_order_by_uid(&self, order_uid: &str) -> Result<Arc<Order>, OrderServiceError> {
        if let Some(order) = self.cache.get(order_uid) {
            tracing::debug!(order_uid = %order_uid, "Cache hit");
            metrics::counter!("order_lookups_total", "source" => "cache").increment(1);
            return Ok(order);
        }

        tracing::debug!(order_uid = %order_uid, "Cache miss, querying repository");
        match self.repo.get_order_by_uid(order_uid).await {
            Ok(order) => {
                let order = Arc::new(order);
                self.cache.set(Arc::clone(&order));
                metrics::counter!("order_lookups_total", "source" => "repository").increment(1);
                Ok(order)
            }
            Err(RepositoryError::NotFound) => {
                warn!(order_uid = %order_uid, "Order not found");
                metrics::counter!("order_lookups_total", "source" => "not_found").increment(1);
                Err(OrderServiceError::NotFound)
            }
            Err(e) => {
                error!(order_uid = %order_uid, error = %e, "Failed to load order");
                Err(OrderServiceError::Repository(e))
            }
        }
    }

    /// Replace the cache contents with the `limit` most recent orders.
    pub async fn preload_cache(&self, limit: usize) -> Result<usize, OrderServiceError> {
        info!(limit, "Preloading order cache");
        let orders = self
            .repo
            .get_last_n_orders(limit)
            .await
            .map_err(OrderServiceError::Repository)?;

        let loaded = orders.len();
        self.cache
            .load_batch(orders.into_iter().map(Arc::new).collect());

        info!(loaded, cached = self.cache.len(), "Order cache preloaded");
        Ok(loaded)
    }

    pub async fn ping_storage(&self) -> Result<(), RepositoryError> {
        self.repo.ping().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("order not found")]
    NotFound,

    #[error("repository error: {0}")]
    Repository(#[source] RepositoryError),
}

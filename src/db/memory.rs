//! In-memory order repository.
//!
//! Used by tests and for running the service without PostgreSQL. Behaves like
//! the PostgreSQL repository: saves replace, reads return owned copies.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::Order;

#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.orders
            .write()
            .await
            .insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        self.orders
            .read()
            .await
            .get(order_uid)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_last_n_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        orders.truncate(limit);
        Ok(orders)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::fixtures::sample_order;
    use chrono::Duration;

    #[tokio::test]
    async fn test_save_then_get() {
        let repo = MemoryOrderRepository::new();
        let order = sample_order("uid-1");
        repo.save_order(&order).await.unwrap();

        assert_eq!(repo.get_order_by_uid("uid-1").await.unwrap(), order);
        assert!(matches!(
            repo.get_order_by_uid("missing").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_last_n_newest_first() {
        let repo = MemoryOrderRepository::new();
        for (i, uid) in ["a", "b", "c"].iter().enumerate() {
            let mut order = sample_order(uid);
            order.date_created += Duration::minutes(i as i64);
            repo.save_order(&order).await.unwrap();
        }

        let uids: Vec<String> = repo
            .get_last_n_orders(2)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_uid)
            .collect();
        assert_eq!(uids, vec!["c", "b"]);
    }
}

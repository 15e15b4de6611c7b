use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::models::order::Order;

pub mod memory;
pub mod queries;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("order not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistent order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store the order with its delivery, payment and items atomically.
    /// Saving an order that already exists replaces it.
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError>;

    /// The `limit` most recently created orders, newest first.
    async fn get_last_n_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

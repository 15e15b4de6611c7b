//! Order lookup service
//!
//! This library provides the order service (cached lookups backed by
//! PostgreSQL, queue-fed ingestion with validation and dead-lettering, and
//! its HTTP routes) together with the order lookup widget that queries it.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod shutdown;
pub mod widget;

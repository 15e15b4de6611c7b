//! Order fixtures shared by the integration tests
#![allow(dead_code)]

pub use order_lookup::models::order::fixtures::sample_order;

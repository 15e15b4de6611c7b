pub mod cache;
pub mod ingest;
pub mod orders;
pub mod queue;
pub mod validation;

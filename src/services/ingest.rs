use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::models::order::Order;
use crate::services::orders::{OrderService, OrderServiceError};
use crate::services::queue::{DeadLetter, DeadLetterReason};
use crate::services::validation::validate_order;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for messages that can never be processed.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn dead_letter(&self, letter: &DeadLetter) -> Result<(), BoxError>;
}

/// What happened to a message that was handled and may be acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Stored { order_uid: String },
    DeadLettered(DeadLetterReason),
}

/// A message that was not handled and must be retried.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to send message to dead-letter queue: {0}")]
    DeadLetter(#[source] BoxError),

    #[error("failed to persist order: {0}")]
    Persist(#[source] OrderServiceError),
}

/// Handle one raw message from the ingestion queue.
///
/// Malformed JSON and orders failing validation can never succeed, so they
/// are dead-lettered and reported as handled. Persistence failures are
/// treated as transient and returned as errors so the caller retries.
pub async fn process_message(
    service: &OrderService,
    dead_letters: &dyn DeadLetterSink,
    source_queue: &str,
    payload: &str,
) -> Result<IngestOutcome, IngestError> {
    let order: Order = match serde_json::from_str(payload) {
        Ok(order) => order,
        Err(e) => {
            warn!(error = %e, queue = %source_queue, "Invalid order JSON, dead-lettering");
            return reject(
                dead_letters,
                source_queue,
                payload,
                DeadLetterReason::JsonUnmarshalFailed,
                e.to_string(),
            )
            .await;
        }
    };

    if let Err(e) = validate_order(&order) {
        return reject(
            dead_letters,
            source_queue,
            payload,
            DeadLetterReason::ValidationFailed,
            e.to_string(),
        )
        .await;
    }

    let order_uid = order.order_uid.clone();
    debug!(order_uid = %order_uid, "Processing new order");
    service
        .process_new_order(order)
        .await
        .map_err(IngestError::Persist)?;

    metrics::counter!("orders_ingested_total").increment(1);
    Ok(IngestOutcome::Stored { order_uid })
}

async fn reject(
    dead_letters: &dyn DeadLetterSink,
    source_queue: &str,
    payload: &str,
    reason: DeadLetterReason,
    details: String,
) -> Result<IngestOutcome, IngestError> {
    let letter = DeadLetter {
        payload: payload.to_string(),
        error_reason: reason,
        error_details: details,
        original_queue: source_queue.to_string(),
        dead_lettered_at: Utc::now(),
    };

    if let Err(e) = dead_letters.dead_letter(&letter).await {
        error!(error = %e, reason = %reason, "Failed to send message to dead-letter queue");
        return Err(IngestError::DeadLetter(e));
    }

    metrics::counter!("orders_dead_lettered_total", "reason" => reason.as_ref().to_string())
        .increment(1);
    Ok(IngestOutcome::DeadLettered(reason))
}

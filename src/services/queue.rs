use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::services::ingest::{BoxError, DeadLetterSink};

/// Why a message was moved to the dead-letter queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeadLetterReason {
    JsonUnmarshalFailed,
    ValidationFailed,
}

/// Dead-letter entry: the untouched payload plus why it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub payload: String,
    pub error_reason: DeadLetterReason,
    pub error_details: String,
    pub original_queue: String,
    pub dead_lettered_at: DateTime<Utc>,
}

/// Redis-backed order ingestion queue.
///
/// Producers `LPUSH` raw order JSON onto the queue list. The consumer moves
/// one message at a time onto a processing list and removes it from there
/// only once it has been handled, so a crashed worker loses nothing:
/// [`OrderQueue::recover_in_flight`] puts leftovers back on startup.
pub struct OrderQueue {
    client: redis::Client,
    queue_key: String,
    processing_key: String,
    dead_letter_key: String,
}

impl OrderQueue {
    pub fn new(redis_url: &str, queue_key: &str, dead_letter_key: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            queue_key: queue_key.to_string(),
            processing_key: format!("{}:processing", queue_key),
            dead_letter_key: dead_letter_key.to_string(),
        })
    }

    pub fn queue_key(&self) -> &str {
        &self.queue_key
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Publish a raw order message.
    pub async fn publish(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        conn.lpush::<_, _, ()>(&self.queue_key, payload).await?;
        Ok(())
    }

    /// Take the oldest message, moving it to the processing list.
    pub async fn fetch(&self) -> Result<Option<String>, QueueError> {
        let mut conn = self.conn().await?;
        let payload: Option<String> = conn
            .rpoplpush(&self.queue_key, &self.processing_key)
            .await?;
        Ok(payload)
    }

    /// Acknowledge a handled message.
    pub async fn ack(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        conn.lrem::<_, _, ()>(&self.processing_key, 1, payload).await?;
        Ok(())
    }

    /// Put a message back on the queue for another attempt.
    pub async fn requeue(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        redis::pipe()
            .atomic()
            .lpush(&self.queue_key, payload)
            .ignore()
            .lrem(&self.processing_key, 1, payload)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Move messages left on the processing list by a previous run back to
    /// the queue. Returns how many were recovered.
    pub async fn recover_in_flight(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn().await?;
        let mut recovered = 0;
        loop {
            let moved: Option<String> = conn
                .rpoplpush(&self.processing_key, &self.queue_key)
                .await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }
        Ok(recovered)
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// Number of messages waiting to be consumed.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.conn().await?;
        Ok(conn.llen(&self.queue_key).await?)
    }
}

#[async_trait]
impl DeadLetterSink for OrderQueue {
    async fn dead_letter(&self, letter: &DeadLetter) -> Result<(), BoxError> {
        let entry = serde_json::to_string(letter).map_err(QueueError::Serialize)?;
        let mut conn = self.conn().await?;
        conn.lpush::<_, _, ()>(&self.dead_letter_key, entry)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! Notification queue producer.
//!
//! Publish-only: messages are serialized and pushed onto a named Redis
//! list, where the notification worker (a separate deployment) pops them.
//! Unlike the cache store, queue failures matter — a lost purchase email is
//! a real defect — so errors surface to the caller instead of degrading
//! silently.

use deadpool_redis::Pool;
use redis::AsyncCommands;
use thiserror::Error;

use bilet_core::QueueMessage;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("queue connection failed: {0}")]
    Pool(String),

    #[error("failed to serialize queue message: {0}")]
    Serialization(String),

    #[error("failed to push queue message: {0}")]
    Push(String),
}

/// Producer handle over the shared Redis pool.
#[derive(Clone)]
pub struct NotificationProducer {
    pool: Pool,
    queue_name: String,
}

impl NotificationProducer {
    pub fn new(pool: Pool, queue_name: String) -> Self {
        Self { pool, queue_name }
    }

    /// Connect a standalone producer (when the cache store runs in-memory
    /// and no shared pool exists).
    pub async fn connect(url: &str, queue_name: String) -> Result<Self, ProducerError> {
        let config = deadpool_redis::Config::from_url(url);
        let pool = config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| ProducerError::Pool(e.to_string()))?;

        // prove the broker is reachable before the first message matters
        pool.get()
            .await
            .map_err(|e| ProducerError::Pool(e.to_string()))?;

        Ok(Self::new(pool, queue_name))
    }

    /// Push one message onto the queue.
    pub async fn enqueue(&self, message: &QueueMessage) -> Result<(), ProducerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ProducerError::Pool(e.to_string()))?;

        let body = serde_json::to_string(message)
            .map_err(|e| ProducerError::Serialization(e.to_string()))?;

        conn.rpush::<_, _, ()>(&self.queue_name, &body)
            .await
            .map_err(|e| ProducerError::Push(e.to_string()))?;

        tracing::debug!(
            queue = %self.queue_name,
            kind = %message.kind,
            "queued notification"
        );

        Ok(())
    }
}

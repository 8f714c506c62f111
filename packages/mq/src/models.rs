use broccoli_queue::queue::BroccoliQueue;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::MqError;

pub type MqQueue = BroccoliQueue;

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
}

pub async fn init_mq(config: &MqConfig) -> Result<MqQueue, MqError> {
    BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await
        .map_err(|e| MqError::Connection(e.to_string()))
}

/// Publishes messages to one named queue.
///
/// The Redis broker keeps queued messages until a consumer acknowledges
/// them, so a successful `publish` means the message is persisted.
pub struct QueuePublisher {
    queue: MqQueue,
    queue_name: String,
}

impl QueuePublisher {
    pub fn new(queue: MqQueue, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    /// Connect to the broker and bind to `queue_name`.
    pub async fn connect(config: &MqConfig, queue_name: impl Into<String>) -> Result<Self, MqError> {
        Ok(Self::new(init_mq(config).await?, queue_name))
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub async fn publish<T>(&self, message: &T) -> Result<(), MqError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        self.queue
            .publish(&self.queue_name, None, message, None)
            .await
            .map_err(|e| MqError::Publish {
                queue: self.queue_name.clone(),
                reason: e.to_string(),
            })?;

        debug!(queue = %self.queue_name, "Message published");
        Ok(())
    }
}

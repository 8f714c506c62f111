use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqError {
    #[error("failed to connect to broker: {0}")]
    Connection(String),

    #[error("failed to publish to queue {queue}: {reason}")]
    Publish { queue: String, reason: String },
}

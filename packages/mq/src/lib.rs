pub mod error;
pub mod models;

pub use error::MqError;
pub use models::{MqConfig, MqQueue, QueuePublisher, init_mq};

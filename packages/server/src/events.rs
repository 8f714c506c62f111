use async_trait::async_trait;
use chrono::Utc;
use common::{Event, UserRegistered};
use mq::{MqError, QueuePublisher};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entity::user;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Mq(#[from] MqError),
}

/// Hands domain events to the durable queue.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_user_registered(&self, user: &user::Model) -> Result<(), PublishError>;
}

pub fn user_registered(user: &user::Model) -> UserRegistered {
    UserRegistered {
        event_id: Uuid::now_v7(),
        user_id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        registered_at: Utc::now(),
    }
}

pub struct QueueEventPublisher {
    publisher: QueuePublisher,
}

impl QueueEventPublisher {
    pub fn new(publisher: QueuePublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EventPublisher for QueueEventPublisher {
    async fn publish_user_registered(&self, user: &user::Model) -> Result<(), PublishError> {
        let event = user_registered(user).to_generic_event();
        self.publisher.publish(&event).await?;
        debug!(
            user_id = %user.id,
            queue = %self.publisher.queue_name(),
            "Registration event published"
        );
        Ok(())
    }
}

/// Used when `mq.enabled` is false.
pub struct DisabledEventPublisher;

#[async_trait]
impl EventPublisher for DisabledEventPublisher {
    async fn publish_user_registered(&self, user: &user::Model) -> Result<(), PublishError> {
        debug!(user_id = %user.id, "MQ disabled, registration event dropped");
        Ok(())
    }
}

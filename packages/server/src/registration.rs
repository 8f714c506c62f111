use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::avatar::AvatarManager;
use crate::entity::user;
use crate::error::AppError;
use crate::events::EventPublisher;
use crate::notify::Notifier;
use crate::repository::{NewUser, RepositoryError, UserChanges, UserRepository};

const EMAIL_TAKEN: &str = "email is already registered";

/// Coordinates user persistence with its side effects.
///
/// Welcome email and registration event are dispatched only after the user
/// row is committed, as independent tasks whose failures are logged and
/// otherwise ignored. Nothing retries them.
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    avatars: Arc<AvatarManager>,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventPublisher>,
    side_effects: TaskTracker,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        avatars: Arc<AvatarManager>,
        notifier: Arc<dyn Notifier>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            users,
            avatars,
            notifier,
            events,
            side_effects: TaskTracker::new(),
        }
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, AppError> {
        let user = self.users.insert(new_user).await.map_err(|e| match e {
            RepositoryError::Duplicate(detail) => {
                debug!(%detail, "Registration rejected by unique index");
                AppError::Conflict(EMAIL_TAKEN.into())
            }
            other => AppError::from(other),
        })?;

        info!(user_id = %user.id, "User registered");
        self.dispatch_side_effects(&user);

        Ok(user)
    }

    pub async fn find_all(&self) -> Result<Vec<user::Model>, AppError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    /// Apply a partial update. Never re-sends the welcome side effects.
    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<user::Model, AppError> {
        self.users
            .update_by_id(id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => AppError::Conflict(EMAIL_TAKEN.into()),
                other => AppError::from(other),
            })?
            .ok_or_else(|| user_not_found(id))
    }

    /// Delete the user's avatar, then the user.
    ///
    /// A failure between the two steps leaves a user without an avatar,
    /// never an avatar without a user.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn remove(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.avatars.delete_avatar_if_exists(id).await?;

        let user = self
            .users
            .delete_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        info!("User removed");
        Ok(user)
    }

    /// Wait until every dispatched side effect has finished.
    pub async fn drain_side_effects(&self) {
        self.side_effects.close();
        self.side_effects.wait().await;
        self.side_effects.reopen();
    }

    fn dispatch_side_effects(&self, user: &user::Model) {
        let notifier = Arc::clone(&self.notifier);
        let welcome_for = user.clone();
        self.side_effects.spawn(async move {
            if let Err(e) = notifier.send_welcome(&welcome_for).await {
                warn!(user_id = %welcome_for.id, error = %e, "Failed to send welcome email");
            }
        });

        let events = Arc::clone(&self.events);
        let registered = user.clone();
        self.side_effects.spawn(async move {
            if let Err(e) = events.publish_user_registered(&registered).await {
                warn!(user_id = %registered.id, error = %e, "Failed to publish registration event");
            }
        });
    }
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User (id={id}) not found"))
}

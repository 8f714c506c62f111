use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::user;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique index rejected the write.
    #[error("unique constraint violated: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl RepositoryError {
    /// Classify a driver error, separating uniqueness violations from everything else.
    pub fn classify(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => RepositoryError::Duplicate(detail),
            _ => RepositoryError::Db(err),
        }
    }
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    pub fn apply_to(self, user: &mut user::Model) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
    }
}

/// Persisted user records. Email uniqueness is enforced by the backing store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, new_user: NewUser) -> Result<user::Model, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<user::Model>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, RepositoryError>;

    /// Returns the updated record, or `None` if no user has this id.
    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<user::Model>, RepositoryError>;

    /// Returns the deleted record, or `None` if no user has this id.
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<user::Model>, RepositoryError>;
}

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<user::Model, RepositoryError> {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            email: Set(new_user.email),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(&self.db).await.map_err(RepositoryError::classify)
    }

    async fn find_all(&self) -> Result<Vec<user::Model>, RepositoryError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, RepositoryError> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<user::Model>, RepositoryError> {
        let txn = self.db.begin().await?;

        let Some(existing) = user::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active = existing.into_active_model();
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        active.updated_at = Set(Utc::now());

        let updated = match active.update(&txn).await {
            Ok(updated) => updated,
            // Deleted between the read and the update.
            Err(DbErr::RecordNotUpdated) => return Ok(None),
            Err(e) => return Err(RepositoryError::classify(e)),
        };
        txn.commit().await?;

        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<user::Model>, RepositoryError> {
        let txn = self.db.begin().await?;

        let Some(existing) = user::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let result = user::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        txn.commit().await?;

        Ok(Some(existing))
    }
}

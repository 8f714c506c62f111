use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use common::storage::{BlobHandle, ContentHash};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entity::avatar;

/// Where an owner's avatar lives and what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarRecord {
    pub owner_id: Uuid,
    pub content_hash: ContentHash,
    pub blob_handle: BlobHandle,
    pub size: u64,
}

impl TryFrom<avatar::Model> for AvatarRecord {
    type Error = DbErr;

    fn try_from(model: avatar::Model) -> Result<Self, Self::Error> {
        let content_hash = ContentHash::from_hex(&model.content_hash).map_err(|e| {
            DbErr::Custom(format!(
                "avatar {} has a malformed content hash: {e}",
                model.id
            ))
        })?;

        Ok(Self {
            owner_id: model.owner_id,
            content_hash,
            blob_handle: BlobHandle::from(model.blob_handle),
            size: model.size.max(0) as u64,
        })
    }
}

/// Persisted owner → blob mapping, one record per owner.
#[async_trait]
pub trait AvatarIndex: Send + Sync {
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<AvatarRecord>, DbErr>;

    /// Insert the record, or replace the existing record for the same owner.
    async fn upsert(&self, record: &AvatarRecord) -> Result<(), DbErr>;

    /// Remove and return the owner's record, if any.
    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<Option<AvatarRecord>, DbErr>;

    /// Every blob handle currently referenced.
    async fn handles(&self) -> Result<HashSet<BlobHandle>, DbErr>;
}

pub struct SeaOrmAvatarIndex {
    db: DatabaseConnection,
}

impl SeaOrmAvatarIndex {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AvatarIndex for SeaOrmAvatarIndex {
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<AvatarRecord>, DbErr> {
        avatar::Entity::find()
            .filter(avatar::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .map(AvatarRecord::try_from)
            .transpose()
    }

    async fn upsert(&self, record: &AvatarRecord) -> Result<(), DbErr> {
        let now = Utc::now();
        let model = avatar::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_id: Set(record.owner_id),
            content_hash: Set(record.content_hash.to_hex()),
            blob_handle: Set(record.blob_handle.as_uuid()),
            size: Set(record.size as i64),
            created_at: Set(now),
            updated_at: Set(now),
        };

        avatar::Entity::insert(model)
            .on_conflict(
                OnConflict::column(avatar::Column::OwnerId)
                    .update_columns([
                        avatar::Column::ContentHash,
                        avatar::Column::BlobHandle,
                        avatar::Column::Size,
                        avatar::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<Option<AvatarRecord>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(existing) = avatar::Entity::find()
            .filter(avatar::Column::OwnerId.eq(owner_id))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        // A concurrent delete may have won since the read.
        let result = avatar::Entity::delete_by_id(existing.id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        txn.commit().await?;

        AvatarRecord::try_from(existing).map(Some)
    }

    async fn handles(&self) -> Result<HashSet<BlobHandle>, DbErr> {
        let handles: Vec<Uuid> = avatar::Entity::find()
            .select_only()
            .column(avatar::Column::BlobHandle)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(handles.into_iter().map(BlobHandle::from).collect())
    }
}

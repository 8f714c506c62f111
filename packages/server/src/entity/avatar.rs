use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Index row tying a user to the blob holding their avatar.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "avatar")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user. At most one avatar per user.
    #[sea_orm(unique)]
    pub owner_id: Uuid,

    /// SHA-256 of the blob bytes, hex encoded.
    pub content_hash: String,

    /// Name of the blob on the storage medium.
    #[sea_orm(unique)]
    pub blob_handle: Uuid,

    pub size: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

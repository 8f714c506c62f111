use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{avatar, user};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Declare the unique indexes the services rely on.
///
/// Duplicate emails and a second avatar for the same owner must be rejected
/// by the database itself; the services never check beforehand.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        (
            "idx_user_email_unique",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_user_email_unique")
                .table(user::Entity)
                .col(user::Column::Email)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_avatar_owner_unique",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_avatar_owner_unique")
                .table(avatar::Entity)
                .col(avatar::Column::OwnerId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_avatar_blob_handle_unique",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_avatar_blob_handle_unique")
                .table(avatar::Entity)
                .col(avatar::Column::BlobHandle)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        db.execute_unprepared(&stmt).await?;
        info!("Ensured index {} exists", name);
    }

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::Utc;
use common::storage::{BlobHandle, BlobStore, ContentHash};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::index::{AvatarIndex, AvatarRecord};
use crate::error::AppError;

/// Outcome of one orphan sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
}

/// Keeps the avatar index and the blob store consistent with each other.
///
/// Blob handles are generated here and nowhere else.
pub struct AvatarManager {
    index: Arc<dyn AvatarIndex>,
    blobs: Arc<dyn BlobStore>,
}

impl AvatarManager {
    pub fn new(index: Arc<dyn AvatarIndex>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { index, blobs }
    }

    /// Replace the owner's avatar when `data` is given, otherwise read it.
    ///
    /// Returns the base64 encoding of the avatar bytes.
    #[instrument(skip(self, data), fields(owner_id = %owner_id, replace = data.is_some()))]
    pub async fn find_or_save_avatar(
        &self,
        owner_id: Uuid,
        data: Option<&[u8]>,
    ) -> Result<String, AppError> {
        match data {
            Some(bytes) => self.replace_avatar(owner_id, bytes).await,
            None => self.read_avatar(owner_id).await,
        }
    }

    async fn read_avatar(&self, owner_id: Uuid) -> Result<String, AppError> {
        let record = self
            .index
            .find_by_owner(owner_id)
            .await?
            .ok_or_else(|| not_found(owner_id))?;

        // A record whose blob vanished out of band reads as "no avatar".
        let bytes = self.blobs.get(&record.blob_handle).await?;
        Ok(BASE64_STANDARD.encode(bytes))
    }

    async fn replace_avatar(&self, owner_id: Uuid, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Avatar file must not be empty".into()));
        }

        let previous = self.index.find_by_owner(owner_id).await?;

        let record = AvatarRecord {
            owner_id,
            content_hash: ContentHash::compute(bytes),
            blob_handle: BlobHandle::generate(),
            size: bytes.len() as u64,
        };

        // Blob first, then index: the index must never point at a blob that was not written.
        self.blobs.put(&record.blob_handle, bytes).await?;
        if let Err(e) = self.index.upsert(&record).await {
            if let Err(cleanup) = self.blobs.delete_if_exists(&record.blob_handle).await {
                warn!(handle = %record.blob_handle, error = %cleanup, "Failed to discard unindexed blob");
            }
            return Err(e.into());
        }

        info!(
            handle = %record.blob_handle,
            content_hash = %record.content_hash,
            size = record.size,
            "Avatar stored"
        );

        // Only now is the previous blob unreachable.
        if let Some(previous) = previous.filter(|p| p.blob_handle != record.blob_handle) {
            self.discard_blob(&previous.blob_handle).await;
        }

        Ok(BASE64_STANDARD.encode(bytes))
    }

    /// Remove the owner's avatar if there is one. Absence is not an error.
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn delete_avatar_if_exists(&self, owner_id: Uuid) -> Result<bool, AppError> {
        match self.index.delete_by_owner(owner_id).await? {
            Some(record) => {
                self.blobs.delete_if_exists(&record.blob_handle).await?;
                info!(handle = %record.blob_handle, "Avatar deleted");
                Ok(true)
            }
            None => {
                debug!("No avatar to delete");
                Ok(false)
            }
        }
    }

    /// Remove the owner's avatar, failing with `NotFound` if there is none.
    pub async fn delete_avatar(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.delete_avatar_if_exists(owner_id).await? {
            Ok(())
        } else {
            Err(not_found(owner_id))
        }
    }

    /// Delete blobs that no index record refers to.
    ///
    /// Blobs modified within `grace` are kept, since a replace may have
    /// written its blob without having upserted the record yet.
    #[instrument(skip(self))]
    pub async fn sweep_orphans(&self, grace: Duration) -> Result<SweepReport, AppError> {
        let stored = self.blobs.list().await?;
        let referenced = self.index.handles().await?;
        let cutoff = Utc::now()
            - chrono::Duration::from_std(grace)
                .map_err(|e| AppError::Internal(format!("Invalid sweep grace period: {e}")))?;

        let mut report = SweepReport {
            scanned: stored.len(),
            removed: 0,
        };

        for entry in stored {
            if referenced.contains(&entry.handle) || entry.modified > cutoff {
                continue;
            }
            match self.blobs.delete_if_exists(&entry.handle).await {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => warn!(handle = %entry.handle, error = %e, "Failed to remove orphaned blob"),
            }
        }

        if report.removed > 0 {
            info!(
                scanned = report.scanned,
                removed = report.removed,
                "Removed orphaned avatar blobs"
            );
        }
        Ok(report)
    }

    /// Best-effort removal of a blob that is no longer referenced.
    /// Failures leave an orphan for the sweep to reclaim.
    async fn discard_blob(&self, handle: &BlobHandle) {
        match self.blobs.delete_if_exists(handle).await {
            Ok(true) => debug!(handle = %handle, "Previous avatar blob removed"),
            Ok(false) => debug!(handle = %handle, "Previous avatar blob was already gone"),
            Err(e) => warn!(handle = %handle, error = %e, "Failed to remove previous avatar blob"),
        }
    }
}

fn not_found(owner_id: Uuid) -> AppError {
    AppError::NotFound(format!("Avatar (userId={owner_id}) not found"))
}

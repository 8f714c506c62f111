use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;
use super::handle::BlobHandle;

/// A blob present on the storage medium, as reported by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub handle: BlobHandle,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Handle-addressed blob storage.
///
/// Writes are not transactional with any index that refers to the handles,
/// callers are responsible for ordering.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` at `handle`, replacing any existing blob.
    async fn put(&self, handle: &BlobHandle, data: &[u8]) -> Result<(), StorageError>;

    /// Read all bytes stored at `handle`.
    async fn get(&self, handle: &BlobHandle) -> Result<Vec<u8>, StorageError>;

    /// Remove the blob at `handle`. Fails with `NotFound` if nothing is stored there.
    async fn delete(&self, handle: &BlobHandle) -> Result<(), StorageError>;

    /// Remove the blob at `handle`, treating absence as success.
    ///
    /// Returns `true` if a blob was removed.
    async fn delete_if_exists(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        match self.delete(handle).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool, StorageError>;

    /// Enumerate every blob currently stored.
    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError>;
}

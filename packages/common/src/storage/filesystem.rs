use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::handle::BlobHandle;
use super::traits::{BlobEntry, BlobStore};

const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs are stored in a sharded directory layout:
/// `{base_path}/{first 2 hex chars}/{remaining 30 hex chars}`
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the root directory if absent.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TEMP_DIR)).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, handle: &BlobHandle) -> PathBuf {
        self.base_path
            .join(handle.shard_prefix())
            .join(handle.shard_suffix())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, handle: &BlobHandle, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let blob_path = self.blob_path(handle);
        let temp_path = self.temp_path();

        // The root may have been removed since construction.
        fs::create_dir_all(self.base_path.join(TEMP_DIR)).await?;

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // rename replaces an existing blob atomically
        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(handle = %handle, size = data.len(), "Blob written");
        Ok(())
    }

    async fn get(&self, handle: &BlobHandle) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.blob_path(handle)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<(), StorageError> {
        match fs::remove_file(self.blob_path(handle)).await {
            Ok(()) => {
                debug!(handle = %handle, "Blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(handle)).await?)
    }

    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut shards = fs::read_dir(&self.base_path).await?;

        while let Some(shard) = shards.next_entry().await? {
            let shard_name = shard.file_name().to_string_lossy().into_owned();
            if shard_name == TEMP_DIR || !shard.file_type().await?.is_dir() {
                continue;
            }

            let mut files = fs::read_dir(shard.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let name = format!("{shard_name}{}", file.file_name().to_string_lossy());
                let handle = match BlobHandle::parse(&name) {
                    Ok(h) => h,
                    Err(_) => {
                        debug!(path = %file.path().display(), "Skipping foreign file in blob store");
                        continue;
                    }
                };
                let meta = file.metadata().await?;
                entries.push(BlobEntry {
                    handle,
                    size: meta.len(),
                    modified: DateTime::<Utc>::from(meta.modified()?),
                });
            }
        }

        Ok(entries)
    }
}

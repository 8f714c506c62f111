use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::StorageError;

/// Opaque, randomly generated name of a stored blob.
///
/// Handles are never derived from user input, so they cannot escape the
/// storage root or collide with another owner's blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobHandle(Uuid);

impl BlobHandle {
    /// Generate a fresh random handle.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a handle from its 32-character hex form (hyphenated UUIDs are accepted too).
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|e| StorageError::InvalidHandle(format!("{s:?}: {e}")))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// First two hex characters, used as the shard directory.
    pub fn shard_prefix(&self) -> String {
        self.to_string()[..2].to_string()
    }

    /// Remaining hex characters, used as the file name within the shard.
    pub fn shard_suffix(&self) -> String {
        self.to_string()[2..].to_string()
    }
}

impl From<Uuid> for BlobHandle {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobHandle({self})")
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// SHA-256 digest of a blob's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

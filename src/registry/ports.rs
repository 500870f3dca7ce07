//! Persistence ports the registry writes through.
//!
//! Implementations live outside the registry: [`super::memory`] for tests
//! and embedded use, [`super::fs`] for artifacts on disk. The registry wraps
//! every call in a timeout, so ports do not need their own.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ImageRef, QrRecord, RecordId};

/// Failures reported by a persistence port
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the call
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Backend I/O failed
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// Artifact handle does not name a stored object
    #[error("no artifact at {0}")]
    MissingArtifact(ImageRef),
}

/// Record persistence keyed by id
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace the record under `id`
    async fn put(&self, id: &RecordId, record: QrRecord) -> Result<(), StoreError>;

    /// Record under `id`, if any
    async fn get(&self, id: &RecordId) -> Result<Option<QrRecord>, StoreError>;

    /// Delete the record; returns whether one existed
    async fn remove(&self, id: &RecordId) -> Result<bool, StoreError>;
}

/// Blob storage for rendered images
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` and return a handle for later loads
    async fn save(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageRef, StoreError>;

    /// Bytes previously saved under `image`
    async fn load(&self, image: &ImageRef) -> Result<Vec<u8>, StoreError>;

    /// Delete the artifact; missing artifacts are not an error
    async fn remove(&self, image: &ImageRef) -> Result<(), StoreError>;
}

//! In-process stores backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::ports::{ArtifactStore, RecordStore, StoreError};
use crate::models::{ImageRef, QrRecord, RecordId};

/// Records held in memory; safe to share across tasks
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: DashMap<RecordId, QrRecord>,
}

impl MemoryRecordStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, id: &RecordId, record: QrRecord) -> Result<(), StoreError> {
        self.records.insert(*id, record);
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<QrRecord>, StoreError> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, id: &RecordId) -> Result<bool, StoreError> {
        Ok(self.records.remove(id).is_some())
    }
}

/// Artifacts held in memory under `mem://<uuid>` handles
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: DashMap<ImageRef, (String, Vec<u8>)>,
}

impl MemoryArtifactStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Content type recorded with `image`
    pub fn content_type(&self, image: &ImageRef) -> Option<String> {
        self.blobs.get(image).map(|entry| entry.value().0.clone())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageRef, StoreError> {
        let image = ImageRef::new(format!("mem://{}", Uuid::new_v4()));
        self.blobs
            .insert(image.clone(), (content_type.to_string(), bytes));
        Ok(image)
    }

    async fn load(&self, image: &ImageRef) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .get(image)
            .map(|entry| entry.value().1.clone())
            .ok_or_else(|| StoreError::MissingArtifact(image.clone()))
    }

    async fn remove(&self, image: &ImageRef) -> Result<(), StoreError> {
        self.blobs.remove(image);
        Ok(())
    }
}

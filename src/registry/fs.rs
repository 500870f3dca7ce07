//! Artifacts as files under `<root>/qr_codes/`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::ports::{ArtifactStore, StoreError};
use crate::models::ImageRef;

const ARTIFACT_DIR: &str = "qr_codes";

/// Stores each artifact as `qr_codes/<uuid>.<ext>` below `root`.
///
/// Handles are paths relative to `root`, so a store opened on the same
/// directory later can load them.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Store writing under `root`; directories are created on first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory handles are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `image`; rejects handles that escape `root`
    fn resolve(&self, image: &ImageRef) -> Result<PathBuf, StoreError> {
        let relative = Path::new(image.as_str());
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Err(StoreError::MissingArtifact(image.clone()));
        }
        Ok(self.root.join(relative))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageRef, StoreError> {
        let dir = self.root.join(ARTIFACT_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        tokio::fs::write(dir.join(&name), &bytes).await?;
        debug!(file = %name, size = bytes.len(), "artifact written");
        Ok(ImageRef::new(format!("{ARTIFACT_DIR}/{name}")))
    }

    async fn load(&self, image: &ImageRef) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(image)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::MissingArtifact(image.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn remove(&self, image: &ImageRef) -> Result<(), StoreError> {
        let path = self.resolve(image)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

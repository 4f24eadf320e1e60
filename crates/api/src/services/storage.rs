//! Floorplan image storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Backend holding uploaded floorplan images.
///
/// Paths are relative, `/`-separated and never escape the backend root.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Write `data` at `path`, replacing any existing file.
    async fn save(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove the file at `path`. Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Move the file at `from` to `to`, replacing any file already there.
    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Public URL of the file at `path`.
    fn url(&self, path: &str) -> String;

    /// Whether the backend can currently accept writes.
    async fn health_check(&self) -> bool;
}

/// Stores images below a directory of the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root, rejecting traversal.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let is_plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !is_plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, data).await?;
        debug!(path, bytes = data.len(), "Wrote image");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.resolve(path)?;
        fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(path, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&source, &target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(from.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        debug!(from, to, "Moved image");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn health_check(&self) -> bool {
        fs::create_dir_all(&self.root).await.is_ok() && self.root.is_dir()
    }
}

//! Local filesystem directory target.

use crate::error::SyncError;
use crate::sync::target::DirectoryTarget;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Writes synced files below a root directory on disk
#[derive(Debug, Clone)]
pub struct FsDirectoryTarget {
    root: PathBuf,
}

impl FsDirectoryTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, SyncError> {
        let reject = |reason: &str| SyncError::Target {
            path: relative.to_string(),
            reason: reason.to_string(),
        };
        if relative.is_empty() {
            return Err(reject("empty path"));
        }
        let rel = Path::new(relative);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                Component::CurDir => {}
                _ => return Err(reject("path escapes the target root")),
            }
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl DirectoryTarget for FsDirectoryTarget {
    async fn create_directory(&self, relative: &str) -> Result<(), SyncError> {
        let path = self.resolve(relative)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| SyncError::Target {
                path: relative.to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), "Created directory");
        Ok(())
    }

    async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), SyncError> {
        let path = self.resolve(relative)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SyncError::Target {
                path: relative.to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
        Ok(())
    }
}

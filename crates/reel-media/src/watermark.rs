//! Watermark asset lookup.
//!
//! The watermark is a fixed image at a well-known path. Its presence is
//! checked at the start of every invocation; a missing file turns the overlay
//! stage off instead of failing the pipeline.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Default watermark path, relative to the server's working directory.
pub const DEFAULT_WATERMARK_PATH: &str = "public/watermark.png";

/// Handle on the watermark image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkAsset {
    path: PathBuf,
}

impl WatermarkAsset {
    /// Use the image at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the image exists right now.
    pub async fn is_available(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the image bytes.
    pub async fn read(&self) -> MediaResult<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::FileNotFound(self.path.clone())
            } else {
                MediaError::Io(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_asset_is_unavailable() {
        let asset = WatermarkAsset::new("/nonexistent/watermark.png");
        assert!(!asset.is_available().await);
        assert!(matches!(asset.read().await, Err(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_present_asset_is_checked_each_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watermark.png");
        let asset = WatermarkAsset::new(&path);

        assert!(!asset.is_available().await);
        tokio::fs::write(&path, b"png").await.unwrap();
        assert!(asset.is_available().await);
        assert_eq!(asset.read().await.unwrap(), b"png");

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(!asset.is_available().await);
    }
}

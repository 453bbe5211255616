//! Checkpoint Store - Line Offset for the Batch Downloader
//!
//! Holds a single integer: the next tag-list line to process. Written
//! with tmp + rename so an interrupted run leaves the previous offset.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

use super::write_atomic;

/// Why the checkpoint could not be read.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to read checkpoint {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("checkpoint {path} holds {content:?}, expected a line number")]
    Invalid { path: String, content: String },
}

/// Line-offset checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    /// Path to the checkpoint file.
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored offset.
    ///
    /// Returns 0 when the file does not exist (first run) or is empty.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<usize, CheckpointError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No checkpoint found, starting at line 0");
                return Ok(0);
            }
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        let first = content.lines().next().unwrap_or("").trim();
        if first.is_empty() {
            warn!("Checkpoint file is empty, starting at line 0");
            return Ok(0);
        }

        first.parse().map_err(|_| CheckpointError::Invalid {
            path: self.path.display().to_string(),
            content: first.to_string(),
        })
    }

    /// Persist `line` as the next offset.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn save(&self, line: usize) -> Result<()> {
        write_atomic(&self.path, line.to_string().as_bytes()).await?;
        info!(line, "Checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("line_number.txt"));
        assert_eq!(store.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("scripts/line_number.txt"));
        store.save(30).await.unwrap();
        assert_eq!(store.load().await.unwrap(), 30);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "30");
    }

    #[tokio::test]
    async fn test_empty_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_number.txt");
        std::fs::write(&path, "").unwrap();
        assert_eq!(CheckpointStore::new(path).load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trailing_newline_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_number.txt");
        std::fs::write(&path, " 120 \n").unwrap();
        assert_eq!(CheckpointStore::new(path).load().await.unwrap(), 120);
    }

    #[tokio::test]
    async fn test_garbage_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_number.txt");
        std::fs::write(&path, "ten").unwrap();
        let err = CheckpointStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid { .. }));
    }
}

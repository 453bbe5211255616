//! Snapshot Store - Formula Records as JSON or JSONL
//!
//! The fetch step writes one record per bottled formula; every later
//! step reads it back. Both a single JSON array and JSON Lines are
//! accepted on read, detected by the first non-blank character.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument, warn};

use super::write_atomic;
use crate::domain::formula::FormulaRecord;

/// On-disk layout of a formula snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SnapshotFormat {
    /// One JSON array.
    #[default]
    Json,
    /// One JSON object per line.
    Jsonl,
}

/// Reads and writes one formula snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record from the snapshot.
    ///
    /// Malformed JSONL lines are skipped with a warning; a malformed
    /// JSON array fails the whole load.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<FormulaRecord>> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;

        let records = parse_snapshot(&content, &self.path)?;
        info!(count = records.len(), "Snapshot loaded");
        Ok(records)
    }

    /// Replace the snapshot with `records`.
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    pub async fn save(&self, records: &[FormulaRecord], format: SnapshotFormat) -> Result<()> {
        let body = match format {
            SnapshotFormat::Json => {
                serde_json::to_string(records).context("Failed to serialize snapshot")?
            }
            SnapshotFormat::Jsonl => {
                let mut body = String::new();
                for record in records {
                    body.push_str(
                        &serde_json::to_string(record)
                            .context("Failed to serialize snapshot record")?,
                    );
                    body.push('\n');
                }
                body
            }
        };

        write_atomic(&self.path, body.as_bytes()).await?;
        info!(?format, "Snapshot saved");
        Ok(())
    }
}

fn parse_snapshot(content: &str, path: &Path) -> Result<Vec<FormulaRecord>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()));
    }

    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FormulaRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    file = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "Skipping malformed snapshot record"
                );
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::formula::BottleFile;

    fn record(name: &str) -> FormulaRecord {
        let mut files = BTreeMap::new();
        files.insert(
            "arm64_sonoma".to_string(),
            BottleFile {
                cellar: Some(":any".to_string()),
                url: Some(format!("https://ghcr.io/v2/homebrew/core/{name}/blobs/sha256:00")),
                sha256: Some("00".to_string()),
                extra: serde_json::Map::new(),
            },
        );
        FormulaRecord {
            name: name.to_string(),
            bottles: Some(files),
        }
    }

    #[tokio::test]
    async fn test_json_and_jsonl_load_identically() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("wget"), record("curl")];

        let json = SnapshotStore::new(dir.path().join("a.json"));
        json.save(&records, SnapshotFormat::Json).await.unwrap();
        let jsonl = SnapshotStore::new(dir.path().join("a.jsonl"));
        jsonl.save(&records, SnapshotFormat::Jsonl).await.unwrap();

        assert_eq!(json.load().await.unwrap(), records);
        assert_eq!(jsonl.load().await.unwrap(), records);

        let raw = std::fs::read_to_string(jsonl.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn test_jsonl_skips_malformed_lines() {
        let content = "{\"name\":\"a\"}\nnot json\n\n{\"name\":\"b\"}\n";
        let records = parse_snapshot(content, Path::new("x.jsonl")).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_array_is_error() {
        assert!(parse_snapshot("[{\"name\": }]", Path::new("x.json")).is_err());
    }

    #[test]
    fn test_empty_file_is_empty_snapshot() {
        assert!(parse_snapshot("  \n", Path::new("x.json")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing.json"));
        assert!(store.load().await.is_err());
    }
}

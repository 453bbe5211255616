//! Persistence Adapters - Flat-File Pipeline State
//!
//! Formula snapshots (JSON array or JSONL), the line-offset checkpoint,
//! and plain name/tag lists. Every file is rewritten whole on each run
//! through a tmp-file rename, so readers never see a partial write.

pub mod checkpoint;
pub mod lists;
pub mod snapshot;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use lists::{read_lines, read_name_list, write_name_list};
pub use snapshot::{SnapshotFormat, SnapshotStore};

/// Sibling temp path used for atomic writes (`<name>.tmp`).
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` via tmp file + rename.
///
/// Creates missing parent directories.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;

    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to rename {} into place", tmp.display()))?;

    Ok(())
}

/// Write `value` to `path` as pretty-printed JSON, atomically.
pub async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    write_atomic(path, &json).await
}

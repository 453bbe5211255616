//! Plain-text line lists (tag lists, formula name lists).

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use super::write_atomic;

/// Every line of `path`, untrimmed, without line terminators.
pub async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Trimmed, non-empty lines of `path`, in file order.
pub async fn read_name_list(path: &Path) -> Result<Vec<String>> {
    Ok(read_lines(path)
        .await?
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Replace `path` with one name per line.
pub async fn write_name_list(path: &Path, names: &[String]) -> Result<()> {
    let mut body = names.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    write_atomic(path, body.as_bytes()).await
}

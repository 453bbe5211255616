//! Filter Unverified - Snapshot Subset from a Name List
//!
//! Rebuilds the unverified snapshot from an operator-curated name list
//! instead of re-running the full sweep.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument};

use crate::adapters::persistence::{read_name_list, SnapshotFormat, SnapshotStore};
use crate::domain::formula::filter_by_names;

/// Counts reported after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
  /// Records in the full snapshot.
  pub total: usize,
  /// Records kept (named in the list).
  pub unsigned: usize,
}

/// Keep the records of `input` named in `names_path` and write them to `output`.
#[instrument(skip_all, fields(input = %input.path().display(), names = %names_path.display()))]
pub async fn filter_unverified(
  input: &SnapshotStore,
  names_path: &Path,
  output: &SnapshotStore,
) -> Result<FilterReport> {
  let formulae = input.load().await?;
  let names: HashSet<String> = read_name_list(names_path).await?.into_iter().collect();

  let filtered = filter_by_names(&formulae, &names);
  output.save(&filtered, SnapshotFormat::Json).await?;

  let report = FilterReport {
    total: formulae.len(),
    unsigned: filtered.len(),
  };
  info!(total = report.total, unsigned = report.unsigned, "Unverified snapshot filtered");
  Ok(report)
}

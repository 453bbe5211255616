//! Fetch Formulae - Bottle Metadata Snapshot
//!
//! Builds the snapshot every later step starts from:
//! 1. List every formula in the catalog
//! 2. Query bottle metadata in batches (argv stays bounded)
//! 3. Keep bottled formulae from the configured tap
//! 4. Replace the snapshot file

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::persistence::{SnapshotFormat, SnapshotStore};
use crate::domain::formula::{extract_records, FormulaRecord};
use crate::ports::package_manager::PackageManager;

/// Outcome of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchReport {
  /// Run identifier (also on every log line of the run).
  pub run_id: Uuid,
  /// Formulae listed by the catalog.
  pub formulae_listed: usize,
  /// Records written to the snapshot.
  pub records_written: usize,
}

/// Snapshot builder over a `PackageManager`.
pub struct FormulaFetcher<P: PackageManager> {
  package_manager: Arc<P>,
  /// Names per `info` invocation.
  batch_size: usize,
  /// Tap filter; `None` keeps every tap.
  tap: Option<String>,
}

impl<P: PackageManager> FormulaFetcher<P> {
  pub fn new(package_manager: Arc<P>, batch_size: usize, tap: Option<String>) -> Self {
    Self {
      package_manager,
      batch_size: batch_size.max(1),
      tap,
    }
  }

  /// Collect bottle records for every formula in the catalog.
  ///
  /// `on_listed` sees the catalog size before any metadata is queried.
  ///
  /// # Errors
  /// An empty catalog is an error, as is any failed or unparsable query.
  pub async fn collect(
    &self,
    on_listed: impl FnOnce(usize),
  ) -> Result<(usize, Vec<FormulaRecord>)> {
    let formulae = self.package_manager.list_formulae().await?;
    anyhow::ensure!(!formulae.is_empty(), "Formula name is empty or invalid.");
    info!(count = formulae.len(), "Processing formulae");
    on_listed(formulae.len());

    let mut records = Vec::new();
    for (batch, names) in formulae.chunks(self.batch_size).enumerate() {
      let json = self.package_manager.info_json(names).await?;
      let extracted = extract_records(&json, self.tap.as_deref())
        .with_context(|| format!("Failed to parse formula data (batch {batch})"))?;
      records.extend(extracted);
    }

    Ok((formulae.len(), records))
  }

  /// Collect records and replace `store` with them.
  ///
  /// On any failure the existing snapshot is left untouched.
  #[instrument(skip(self, store, on_listed), fields(run_id))]
  pub async fn run(
    &self,
    store: &SnapshotStore,
    format: SnapshotFormat,
    on_listed: impl FnOnce(usize),
  ) -> Result<FetchReport> {
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));

    let (formulae_listed, records) = self.collect(on_listed).await?;
    store.save(&records, format).await?;

    info!(
      listed = formulae_listed,
      written = records.len(),
      path = %store.path().display(),
      "Bottle data snapshot written"
    );

    Ok(FetchReport {
      run_id,
      formulae_listed,
      records_written: records.len(),
    })
  }
}

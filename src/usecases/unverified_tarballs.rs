//! Unverified Tarballs - Locate Cached Bottles Missing Provenance
//!
//! For a formula that fails host verification, re-verify every bottle
//! tag and collect the cached tarball path each failing tag reports.
//! These are the files the signing workflow needs to attest.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::adapters::persistence::{write_json, SnapshotStore};
use crate::domain::formula::FormulaRecord;
use crate::domain::tarball::first_absolute_tarball;
use crate::ports::package_manager::{BottleRef, PackageManager};

/// Cached tarballs of one formula that failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnverifiedTarballs {
  pub name: String,
  /// One path per failing bottle tag that reported a tarball.
  pub paths: Vec<String>,
}

/// Per-tag tarball discovery.
pub struct TarballFinder<P: PackageManager> {
  package_manager: Arc<P>,
  /// Formulae examined concurrently.
  concurrency: usize,
}

impl<P: PackageManager> TarballFinder<P> {
  pub fn new(package_manager: Arc<P>, concurrency: usize) -> Self {
    Self {
      package_manager,
      concurrency: concurrency.max(1),
    }
  }

  /// Cached tarball paths of `formula`'s failing bottle tags.
  ///
  /// Empty when host verification passes. Tags whose check cannot run
  /// are logged and skipped.
  ///
  /// # Errors
  /// Only when the host verification itself cannot run.
  #[instrument(skip(self, formula), fields(formula = %formula.name))]
  pub async fn find(&self, formula: &FormulaRecord) -> Result<Vec<String>> {
    let host = self
      .package_manager
      .verify(&BottleRef::host(formula.name.clone()))
      .await?;
    if host.success {
      debug!("Host bottle verified, skipping tags");
      return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for tag in formula.bottle_tags() {
      let bottle = BottleRef::tagged(formula.name.clone(), tag);
      match self.package_manager.verify(&bottle).await {
        Ok(out) if out.success => {}
        Ok(out) => {
          if let Some(path) = first_absolute_tarball(&out.stdout) {
            paths.push(path.to_string());
          } else {
            debug!(tag, "Failing tag reported no cached tarball");
          }
        }
        Err(e) => warn!(tag, error = %e, "Tag verification could not run"),
      }
    }
    Ok(paths)
  }

  /// Run `find` over `formulae`, returning results in input order.
  ///
  /// Formulae whose host check cannot run are logged and omitted.
  pub async fn find_all(&self, formulae: &[FormulaRecord]) -> Vec<UnverifiedTarballs> {
    stream::iter(formulae.iter().map(|formula| async move {
      match self.find(formula).await {
        Ok(paths) => Some(UnverifiedTarballs {
          name: formula.name.clone(),
          paths,
        }),
        Err(e) => {
          warn!(formula = %formula.name, error = %e, "Skipping formula");
          None
        }
      }
    }))
    .buffered(self.concurrency)
    .filter_map(|found| async move { found })
    .collect()
    .await
  }

  /// Find tarballs for the formulae of `input`, restricted to `only`
  /// when it is non-empty, and optionally write them to `output` as JSON.
  ///
  /// Names in `only` that the snapshot lacks are logged and ignored.
  #[instrument(skip_all, fields(input = %input.path().display(), only = only.len()))]
  pub async fn run(
    &self,
    input: &SnapshotStore,
    only: &[String],
    output: Option<&Path>,
  ) -> Result<Vec<UnverifiedTarballs>> {
    let records = select(input.load().await?, only);
    let found = self.find_all(&records).await;

    if let Some(path) = output {
      write_json(path, &found).await?;
    }
    Ok(found)
  }
}

/// Keep the records named in `only`, or all of them when `only` is empty.
fn select(mut records: Vec<FormulaRecord>, only: &[String]) -> Vec<FormulaRecord> {
  if only.is_empty() {
    return records;
  }

  records.retain(|r| only.contains(&r.name));
  for missing in only.iter().filter(|name| !records.iter().any(|r| &r.name == *name)) {
    warn!(formula = %missing, "Formula not in snapshot");
  }
  records
}

//! Scan Unverified - Parallel Provenance Sweep
//!
//! Runs `verify` for every formula in the snapshot through a bounded
//! pool and collects results as they complete. A formula whose check
//! could not run is logged and left out; nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::adapters::persistence::{write_name_list, SnapshotFormat, SnapshotStore};
use crate::domain::formula::{filter_by_names, FormulaRecord};
use crate::ports::package_manager::{BottleRef, PackageManager};

/// Classification of a full sweep.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
  /// Formulae checked.
  pub total: usize,
  /// Formulae that passed verification.
  pub verified: usize,
  /// Failing formula names, in completion order.
  pub unverified: Vec<String>,
  /// Formulae whose check could not run.
  pub errored: Vec<String>,
}

/// Log line for a check that could not run at all.
fn exception_message(bottle: &BottleRef, error: &anyhow::Error) -> String {
  format!("verify {bottle} generated an exception: {error:#}")
}

/// Bounded-concurrency verification sweep.
pub struct VerificationScanner<P: PackageManager> {
  package_manager: Arc<P>,
  /// Maximum in-flight verify subprocesses.
  concurrency: usize,
}

impl<P: PackageManager> VerificationScanner<P> {
  pub fn new(package_manager: Arc<P>, concurrency: usize) -> Self {
    Self {
      package_manager,
      concurrency: concurrency.max(1),
    }
  }

  /// Verify every formula; `on_unverified` sees each failure as it lands.
  #[instrument(skip_all, fields(total = formulae.len(), concurrency = self.concurrency))]
  pub async fn scan(
    &self,
    formulae: &[FormulaRecord],
    mut on_unverified: impl FnMut(&str),
  ) -> ScanReport {
    let mut report = ScanReport {
      total: formulae.len(),
      ..ScanReport::default()
    };

    let mut results = stream::iter(formulae.iter().map(|formula| {
      let package_manager = Arc::clone(&self.package_manager);
      let bottle = BottleRef::host(formula.name.clone());
      async move {
        let result = package_manager.verify(&bottle).await;
        (bottle, result)
      }
    }))
    .buffer_unordered(self.concurrency);

    while let Some((bottle, result)) = results.next().await {
      match result {
        Ok(out) if out.success => report.verified += 1,
        Ok(_) => {
          on_unverified(&bottle.formula);
          report.unverified.push(bottle.formula);
        }
        Err(e) => {
          warn!(formula = %bottle.formula, "{}", exception_message(&bottle, &e));
          report.errored.push(bottle.formula);
        }
      }
    }

    info!(
      verified = report.verified,
      unverified = report.unverified.len(),
      errored = report.errored.len(),
      "Verification sweep complete"
    );
    report
  }

  /// Sweep `input`, then write the failing records and their names.
  ///
  /// The output snapshot keeps `input` order regardless of completion order.
  pub async fn run(
    &self,
    input: &SnapshotStore,
    output: &SnapshotStore,
    names_output: Option<&std::path::Path>,
    on_unverified: impl FnMut(&str),
  ) -> Result<ScanReport> {
    let formulae = input.load().await?;
    let report = self.scan(&formulae, on_unverified).await;

    let failing: HashSet<String> = report.unverified.iter().cloned().collect();
    let unverified = filter_by_names(&formulae, &failing);
    output.save(&unverified, SnapshotFormat::Json).await?;

    if let Some(path) = names_output {
      let names: Vec<String> = unverified.iter().map(|r| r.name.clone()).collect();
      write_name_list(path, &names).await?;
    }

    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exception_message_names_the_command() {
    let error = anyhow::anyhow!("timed out after 5s").context("brew verify wget");
    let message = exception_message(&BottleRef::host("wget"), &error);
    assert!(message.starts_with("verify wget generated an exception: "));
    assert!(message.ends_with("brew verify wget: timed out after 5s"));
  }
}

//! Attest - Build Provenance Check for Bottles
//!
//! Fetches each requested formula's bottle, resolves its cached
//! download and checks the attestation against the signing repository.
//! Bottle files already on disk can be checked directly.
//!
//! `os`/`arch` selectors fan each formula out over every selected
//! platform. A platform with no bottle is skipped with a warning.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::attestation::BottleAttestation;
use crate::domain::platform::os_arch_combinations;
use crate::ports::attestation::AttestationVerifier;
use crate::ports::package_manager::{BottleFetch, BottleRef, PackageManager};

/// What to attest in one run.
#[derive(Debug, Clone, Default)]
pub struct AttestRequest {
  /// Formulae whose bottles are fetched and checked.
  pub formulae: Vec<String>,
  /// Bottle files checked as-is.
  pub paths: Vec<String>,
  /// Bottle tag to fetch; `None` is the host tag.
  pub bottle_tag: Option<String>,
  /// OS to fetch for, or `all`. Exclusive with `bottle_tag`.
  pub os: Option<String>,
  /// CPU architecture to fetch for, or `all`. Exclusive with `bottle_tag`.
  pub arch: Option<String>,
  /// Also check every recursive dependency of `formulae`.
  pub deps: bool,
  /// Re-download bottles already in the cache.
  pub force: bool,
}

/// Results of one attestation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttestReport {
  /// One entry per bottle actually checked.
  pub checked: Vec<BottleAttestation>,
  /// Bottles that could not be fetched or checked, with the reason.
  pub failed: Vec<(String, String)>,
  /// Bottles that do not exist for the requested tag or platform.
  pub skipped: Vec<String>,
}

impl AttestReport {
  /// True when every existing bottle was checked and verified.
  pub fn all_verified(&self) -> bool {
    self.failed.is_empty() && self.checked.iter().all(|c| c.outcome.is_verified())
  }
}

/// Attestation driver over the package manager and verifier ports.
pub struct Attestor<P: PackageManager, A: AttestationVerifier> {
  package_manager: Arc<P>,
  verifier: Arc<A>,
  /// Repository whose workflow signs the bottles.
  signing_repo: String,
}

impl<P: PackageManager, A: AttestationVerifier> Attestor<P, A> {
  pub fn new(package_manager: Arc<P>, verifier: Arc<A>, signing_repo: impl Into<String>) -> Self {
    Self {
      package_manager,
      verifier,
      signing_repo: signing_repo.into(),
    }
  }

  /// Requested formulae followed by their dependencies, first occurrence wins.
  pub async fn resolve_targets(&self, formulae: &[String], deps: bool) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for name in formulae {
      if seen.insert(name.clone()) {
        targets.push(name.clone());
      }
      if deps {
        for dep in self.package_manager.recursive_dependencies(name).await? {
          if seen.insert(dep.clone()) {
            targets.push(dep);
          }
        }
      }
    }
    Ok(targets)
  }

  /// Fetch and check one bottle.
  ///
  /// `None` when the package manager has no bottle for the requested
  /// tag or platform.
  #[instrument(skip(self), fields(bottle = %bottle))]
  pub async fn attest_formula(
    &self,
    bottle: &BottleRef,
    force: bool,
  ) -> Result<Option<BottleAttestation>> {
    if self.package_manager.fetch_bottle(bottle, force).await? == BottleFetch::Unavailable {
      warn!("Bottle is unavailable, skipping");
      return Ok(None);
    }

    let path = self.package_manager.cached_download(bottle).await?;
    let outcome = self
      .verifier
      .verify_attestation(&path, &self.signing_repo)
      .await?;

    info!(path = %path, outcome = %outcome, "Attestation checked");
    Ok(Some(BottleAttestation {
      formula: Some(bottle.formula.clone()),
      bottle_tag: bottle.bottle_tag.clone(),
      os: bottle.os.clone(),
      arch: bottle.arch.clone(),
      path,
      outcome,
    }))
  }

  /// Check a bottle file already on disk.
  #[instrument(skip(self))]
  pub async fn attest_path(&self, path: &str) -> Result<BottleAttestation> {
    let outcome = self
      .verifier
      .verify_attestation(path, &self.signing_repo)
      .await?;
    info!(outcome = %outcome, "Attestation checked");
    Ok(BottleAttestation {
      formula: None,
      bottle_tag: None,
      os: None,
      arch: None,
      path: path.to_string(),
      outcome,
    })
  }

  /// Check every bottle in `request`; `on_checked` sees each result as it lands.
  ///
  /// A bottle that cannot be fetched or checked is recorded in
  /// `failed`, a bottle that does not exist in `skipped`, and the run
  /// continues.
  pub async fn run(
    &self,
    request: &AttestRequest,
    mut on_checked: impl FnMut(&BottleAttestation),
  ) -> Result<AttestReport> {
    anyhow::ensure!(
      request.bottle_tag.is_none() || (request.os.is_none() && request.arch.is_none()),
      "--bottle-tag cannot be combined with --os or --arch"
    );

    let targets = self.resolve_targets(&request.formulae, request.deps).await?;
    let platforms = os_arch_combinations(request.os.as_deref(), request.arch.as_deref());
    let mut report = AttestReport::default();

    for name in &targets {
      for platform in &platforms {
        let bottle = BottleRef {
          formula: name.clone(),
          bottle_tag: request.bottle_tag.clone(),
          os: platform.os.clone(),
          arch: platform.arch.clone(),
        };

        match self.attest_formula(&bottle, request.force).await {
          Ok(Some(checked)) => {
            on_checked(&checked);
            report.checked.push(checked);
          }
          Ok(None) => report.skipped.push(bottle.to_string()),
          Err(e) => {
            warn!(bottle = %bottle, error = %e, "Bottle could not be attested");
            report.failed.push((bottle.to_string(), format!("{e:#}")));
          }
        }
      }
    }

    for path in &request.paths {
      match self.attest_path(path).await {
        Ok(checked) => {
          on_checked(&checked);
          report.checked.push(checked);
        }
        Err(e) => {
          warn!(path = %path, error = %e, "Bottle could not be attested");
          report.failed.push((path.clone(), format!("{e:#}")));
        }
      }
    }

    Ok(report)
  }
}

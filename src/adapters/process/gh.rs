//! GitHub CLI Adapter - `AttestationVerifier` over `gh attestation verify`

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::runner::ProcessRunner;
use crate::domain::attestation::AttestationOutcome;
use crate::ports::attestation::AttestationVerifier;

/// Checks build provenance with `gh attestation verify --format json`.
pub struct GhAttestation {
  /// `gh` executable name or path.
  binary: String,
  /// Shared subprocess launcher.
  runner: ProcessRunner,
}

impl GhAttestation {
  pub fn new(binary: impl Into<String>, runner: ProcessRunner) -> Self {
    Self {
      binary: binary.into(),
      runner,
    }
  }
}

#[async_trait]
impl AttestationVerifier for GhAttestation {
  #[instrument(skip(self))]
  async fn verify_attestation(
    &self,
    bottle_path: &str,
    signing_repo: &str,
  ) -> Result<AttestationOutcome> {
    let args = vec![
      "attestation".to_string(),
      "verify".to_string(),
      bottle_path.to_string(),
      "-R".to_string(),
      signing_repo.to_string(),
      "--format".to_string(),
      "json".to_string(),
    ];

    let out = self.runner.run(&self.binary, &args).await?;
    if !out.success {
      debug!(stderr = %out.stderr.trim(), "Attestation check failed");
    }

    Ok(AttestationOutcome::from_output(
      out.success,
      out.exit_code,
      &out.stdout,
    ))
  }
}

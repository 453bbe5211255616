//! Attestation Port - Build Provenance Verification Interface

use async_trait::async_trait;

use crate::domain::attestation::AttestationOutcome;

/// Trait for build-provenance attestation checkers.
///
/// A failed or negative verification is reported through the returned
/// `AttestationOutcome`; `Err` means the checker itself could not run.
#[async_trait]
pub trait AttestationVerifier: Send + Sync + 'static {
  /// Check `bottle_path` against attestations issued by `signing_repo`.
  async fn verify_attestation(
    &self,
    bottle_path: &str,
    signing_repo: &str,
  ) -> anyhow::Result<AttestationOutcome>;
}

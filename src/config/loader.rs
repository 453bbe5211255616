//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the optional TOML file, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration.
///
/// `None` yields validated defaults; a path that cannot be read is an
/// error rather than a silent fallback.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
  let config = match path {
    Some(path) => {
      let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

      let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

      info!(path = %path.display(), "Configuration loaded");
      config
    }
    None => AppConfig::default(),
  };

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
pub fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.brew.binary.trim().is_empty(),
    "brew.binary must not be empty"
  );
  anyhow::ensure!(
    config.brew.timeout_seconds > 0,
    "brew.timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.brew.info_batch_size > 0,
    "brew.info_batch_size must be positive"
  );

  anyhow::ensure!(
    !config.attestation.gh_binary.trim().is_empty(),
    "attestation.gh_binary must not be empty"
  );
  anyhow::ensure!(
    config.attestation.signing_repo.split('/').filter(|s| !s.is_empty()).count() == 2,
    "attestation.signing_repo must be `owner/repo`, got {:?}",
    config.attestation.signing_repo
  );
  anyhow::ensure!(
    config.attestation.timeout_seconds > 0,
    "attestation.timeout_seconds must be positive"
  );

  anyhow::ensure!(
    config.scan.concurrency > 0,
    "scan.concurrency must be positive"
  );

  let paths = [
    ("paths.formulae_snapshot", &config.paths.formulae_snapshot),
    ("paths.unverified_snapshot", &config.paths.unverified_snapshot),
    ("paths.unverified_names", &config.paths.unverified_names),
    ("paths.line_state_file", &config.paths.line_state_file),
    ("paths.bottle_tag_file", &config.paths.bottle_tag_file),
  ];
  for (key, value) in paths {
    anyhow::ensure!(!value.is_empty(), "{key} must not be empty");
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config(Some(Path::new("nonexistent.toml")));
    assert!(result.is_err());
  }

  #[test]
  fn test_no_file_gives_valid_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config.brew.binary, "brew");
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bottle-audit.toml");
    std::fs::write(
      &path,
      "[scan]\nconcurrency = 3\n[attestation]\nsigning_repo = \"acme/bottles\"\n",
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.scan.concurrency, 3);
    assert_eq!(config.attestation.signing_repo, "acme/bottles");
  }

  #[test]
  fn test_example_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("bottle-audit.example.toml");
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.scan.concurrency, 8);
    assert_eq!(config.brew.tap_filter(), Some("homebrew/core"));
    assert!(config.metrics.textfile.is_none());
  }

  #[test]
  fn test_rejects_bad_signing_repo() {
    let mut config = AppConfig::default();
    config.attestation.signing_repo = "homebrew-core".to_string();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_rejects_zero_concurrency() {
    let mut config = AppConfig::default();
    config.scan.concurrency = 0;
    assert!(validate_config(&config).is_err());
  }
}

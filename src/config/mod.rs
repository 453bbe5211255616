//! Configuration Module - TOML-based Pipeline Configuration
//!
//! Every section is optional: an absent file or an empty table yields
//! the defaults the operator scripts have always used (`brew` and `gh`
//! from `PATH`, state files relative to the working directory).
//! Command-line flags override individual values after loading.

pub mod loader;

use serde::Deserialize;

use crate::domain::attestation::DEFAULT_SIGNING_REPO;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Package manager CLI settings.
  pub brew: BrewConfig,
  /// Attestation checker settings.
  pub attestation: AttestationConfig,
  /// Parallel verification scan settings.
  pub scan: ScanConfig,
  /// Batch downloader settings.
  pub download: DownloadConfig,
  /// Locations of every pipeline state file.
  pub paths: PathsConfig,
  /// Log output settings.
  pub logging: LoggingConfig,
  /// Run metrics export.
  pub metrics: MetricsConfig,
}

/// Package manager CLI configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrewConfig {
  /// Executable name or path.
  pub binary: String,
  /// Per-command timeout in seconds.
  pub timeout_seconds: u64,
  /// Maximum formula names passed to one `info` invocation.
  pub info_batch_size: usize,
  /// Only keep formulae from this tap. Empty string keeps every tap.
  pub tap: String,
}

/// Attestation checker configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
  /// `gh` executable name or path.
  pub gh_binary: String,
  /// Repository whose workflow signs bottles.
  pub signing_repo: String,
  /// Per-command timeout in seconds.
  pub timeout_seconds: u64,
}

/// Parallel verification scan configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
  /// Maximum concurrent verification subprocesses.
  pub concurrency: usize,
}

/// Batch downloader configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
  /// Tag-list lines processed per run.
  pub num_lines: usize,
}

/// Pipeline file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
  /// Snapshot of every bottled formula.
  pub formulae_snapshot: String,
  /// Snapshot of formulae failing verification.
  pub unverified_snapshot: String,
  /// Plain list of unverified formula names.
  pub unverified_names: String,
  /// Checkpoint holding the next tag-list line to process.
  pub line_state_file: String,
  /// `<formula> <bottle tag>` work list.
  pub bottle_tag_file: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  pub level: String,
  /// Emit JSON lines instead of human-readable logs.
  pub json: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
  /// Write Prometheus text exposition here at exit (textfile collector).
  pub textfile: Option<String>,
}

impl BrewConfig {
  /// Tap filter, `None` when every tap is accepted.
  pub fn tap_filter(&self) -> Option<&str> {
    if self.tap.is_empty() {
      None
    } else {
      Some(&self.tap)
    }
  }
}

impl Default for BrewConfig {
  fn default() -> Self {
    Self {
      binary: "brew".to_string(),
      timeout_seconds: 1800,
      info_batch_size: 500,
      tap: "homebrew/core".to_string(),
    }
  }
}

impl Default for AttestationConfig {
  fn default() -> Self {
    Self {
      gh_binary: "gh".to_string(),
      signing_repo: DEFAULT_SIGNING_REPO.to_string(),
      timeout_seconds: 120,
    }
  }
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      concurrency: std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4),
    }
  }
}

impl Default for DownloadConfig {
  fn default() -> Self {
    Self { num_lines: 10 }
  }
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      formulae_snapshot: "homebrew_formulae.json".to_string(),
      unverified_snapshot: "unverified_formulae.json".to_string(),
      unverified_names: "unverified.txt".to_string(),
      line_state_file: "scripts/line_number.txt".to_string(),
      bottle_tag_file: "scripts/tags_to_sign.txt".to_string(),
    }
  }
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      json: false,
    }
  }
}

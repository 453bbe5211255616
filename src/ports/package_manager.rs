//! Package Manager Port - Formula Catalog and Bottle Verification
//!
//! Defines the trait for everything the pipeline asks of the package
//! manager CLI: listing formulae, dumping bottle metadata, verifying,
//! fetching and locating bottles, and resolving dependencies.

use async_trait::async_trait;

use crate::domain::formula::BottleTag;
use crate::domain::platform::OsArch;

/// Captured result of one external command.
///
/// A non-zero exit is data, not an error: verification failures are
/// exactly what the pipeline is looking for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Whether the process exited with status 0.
  pub success: bool,
  /// Exit code (`None` when terminated by a signal).
  pub exit_code: Option<i32>,
  /// Captured stdout, lossily decoded.
  pub stdout: String,
  /// Captured stderr, lossily decoded.
  pub stderr: String,
}

/// A formula, optionally pinned to one bottle tag or platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BottleRef {
  /// Formula name.
  pub formula: String,
  /// Bottle tag; `None` means the host's own tag.
  pub bottle_tag: Option<BottleTag>,
  /// Simulated OS; `None` means the host's.
  pub os: Option<String>,
  /// Simulated CPU architecture; `None` means the host's.
  pub arch: Option<String>,
}

impl BottleRef {
  /// Reference to the host-tag bottle of `formula`.
  pub fn host(formula: impl Into<String>) -> Self {
    Self {
      formula: formula.into(),
      bottle_tag: None,
      os: None,
      arch: None,
    }
  }

  /// Reference to `formula`'s bottle for `tag`.
  pub fn tagged(formula: impl Into<String>, tag: impl Into<BottleTag>) -> Self {
    Self {
      bottle_tag: Some(tag.into()),
      ..Self::host(formula)
    }
  }

  /// Same formula and tag, simulated on `platform`.
  #[must_use]
  pub fn on(self, platform: &OsArch) -> Self {
    Self {
      os: platform.os.clone(),
      arch: platform.arch.clone(),
      ..self
    }
  }
}

impl std::fmt::Display for BottleRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.formula)?;
    if let Some(tag) = &self.bottle_tag {
      write!(f, " --bottle-tag {tag}")?;
    }
    if let Some(os) = &self.os {
      write!(f, " --os {os}")?;
    }
    if let Some(arch) = &self.arch {
      write!(f, " --arch {arch}")?;
    }
    Ok(())
  }
}

/// Result of asking the package manager to download a bottle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BottleFetch {
  /// The bottle is in the local cache.
  Fetched,
  /// No bottle exists for the requested tag or platform.
  Unavailable,
}

/// Trait for package manager CLI providers.
///
/// Implementors shell out to the real tool; tests substitute mocks.
#[async_trait]
pub trait PackageManager: Send + Sync + 'static {
  /// Names of every formula in the catalog.
  async fn list_formulae(&self) -> anyhow::Result<Vec<String>>;

  /// Raw `info --json --variations` output for `names`.
  ///
  /// # Errors
  /// Returns error when `names` holds no non-empty name or the tool fails.
  async fn info_json(&self, names: &[String]) -> anyhow::Result<String>;

  /// Run provenance verification for a bottle.
  ///
  /// Errors only when the command could not run to completion.
  async fn verify(&self, bottle: &BottleRef) -> anyhow::Result<CommandOutput>;

  /// Download a bottle into the local cache.
  ///
  /// A bottle missing for the requested tag is `Unavailable`, not an error.
  async fn fetch_bottle(&self, bottle: &BottleRef, force: bool) -> anyhow::Result<BottleFetch>;

  /// Local cache path of a bottle's download.
  async fn cached_download(&self, bottle: &BottleRef) -> anyhow::Result<String>;

  /// Every formula `name` depends on, recursively.
  async fn recursive_dependencies(&self, name: &str) -> anyhow::Result<Vec<String>>;
}

//! Homebrew CLI Adapter - `PackageManager` over the `brew` binary

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{instrument, warn};

use super::runner::{describe, CommandError, ProcessRunner};
use crate::domain::platform::reports_unavailable_bottle;
use crate::ports::package_manager::{BottleFetch, BottleRef, CommandOutput, PackageManager};

/// `PackageManager` implementation that shells out to `brew`.
pub struct BrewCli {
  /// Executable name or path.
  binary: String,
  /// Shared subprocess launcher.
  runner: ProcessRunner,
}

impl BrewCli {
  /// Create an adapter for `binary` (usually `"brew"` from `PATH`).
  pub fn new(binary: impl Into<String>, runner: ProcessRunner) -> Self {
    Self {
      binary: binary.into(),
      runner,
    }
  }

  /// Append `--bottle-tag`, `--os` and `--arch` for whichever are set.
  fn push_selectors(args: &mut Vec<String>, bottle: &BottleRef) {
    let selectors = [
      ("--bottle-tag", &bottle.bottle_tag),
      ("--os", &bottle.os),
      ("--arch", &bottle.arch),
    ];
    for (flag, value) in selectors {
      if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.clone());
      }
    }
  }
}

/// Non-empty trimmed lines of `stdout`.
fn lines(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_string)
    .collect()
}

#[async_trait]
impl PackageManager for BrewCli {
  #[instrument(skip(self))]
  async fn list_formulae(&self) -> Result<Vec<String>> {
    let out = self
      .runner
      .run_strict(&self.binary, &["formulae".to_string()])
      .await
      .context("Error getting formulae list")?;
    Ok(lines(&out.stdout))
  }

  #[instrument(skip(self, names), fields(count = names.len()))]
  async fn info_json(&self, names: &[String]) -> Result<String> {
    let mut args = vec![
      "info".to_string(),
      "--json".to_string(),
      "--variations".to_string(),
    ];
    args.extend(names.iter().filter(|n| !n.is_empty()).cloned());
    anyhow::ensure!(args.len() > 3, "Formula name is empty or invalid.");

    let out = self
      .runner
      .run_strict(&self.binary, &args)
      .await
      .context("Error getting formula data for formulae")?;
    Ok(out.stdout)
  }

  #[instrument(skip(self), fields(bottle = %bottle))]
  async fn verify(&self, bottle: &BottleRef) -> Result<CommandOutput> {
    let mut args = vec!["verify".to_string(), bottle.formula.clone()];
    Self::push_selectors(&mut args, bottle);
    Ok(self.runner.run(&self.binary, &args).await?)
  }

  #[instrument(skip(self), fields(bottle = %bottle))]
  async fn fetch_bottle(&self, bottle: &BottleRef, force: bool) -> Result<BottleFetch> {
    let mut args = vec!["fetch".to_string(), "--formula".to_string()];
    if force {
      args.push("--force".to_string());
    }
    Self::push_selectors(&mut args, bottle);
    args.push(bottle.formula.clone());

    let out = self.runner.run(&self.binary, &args).await?;
    if reports_unavailable_bottle(&out.stderr) || reports_unavailable_bottle(&out.stdout) {
      return Ok(BottleFetch::Unavailable);
    }
    if !out.success {
      return Err(CommandError::NonZeroExit {
        command: describe(&self.binary, &args),
        code: out.exit_code,
        stderr: out.stderr,
      })
      .with_context(|| format!("Failed to fetch bottle for {bottle}"));
    }
    Ok(BottleFetch::Fetched)
  }

  #[instrument(skip(self), fields(bottle = %bottle))]
  async fn cached_download(&self, bottle: &BottleRef) -> Result<String> {
    let mut args = vec!["--cache".to_string()];
    Self::push_selectors(&mut args, bottle);
    args.push(bottle.formula.clone());

    let out = self
      .runner
      .run_checked(&self.binary, &args)
      .await
      .with_context(|| format!("Failed to resolve cache path for {bottle}"))?;

    let mut paths = lines(&out.stdout);
    if paths.len() > 1 {
      warn!(count = paths.len(), "Multiple cache paths reported, using the last");
    }
    paths
      .pop()
      .with_context(|| format!("No cache path reported for {bottle}"))
  }

  #[instrument(skip(self))]
  async fn recursive_dependencies(&self, name: &str) -> Result<Vec<String>> {
    let args = vec!["deps".to_string(), "--formula".to_string(), name.to_string()];
    let out = self
      .runner
      .run_checked(&self.binary, &args)
      .await
      .with_context(|| format!("Failed to list dependencies of {name}"))?;
    Ok(lines(&out.stdout))
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::domain::platform::OsArch;

  // `echo` stands in for `brew`: stdout is the argument vector.
  fn echo_brew() -> BrewCli {
    BrewCli::new("echo", ProcessRunner::new(Duration::from_secs(10)))
  }

  #[tokio::test]
  async fn test_verify_args_with_tag() {
    let out = echo_brew()
      .verify(&BottleRef::tagged("wget", "arm64_sonoma"))
      .await
      .unwrap();
    assert!(out.success);
    assert_eq!(out.stdout.trim(), "verify wget --bottle-tag arm64_sonoma");
  }

  #[tokio::test]
  async fn test_verify_args_host_tag() {
    let out = echo_brew().verify(&BottleRef::host("wget")).await.unwrap();
    assert_eq!(out.stdout.trim(), "verify wget");
  }

  #[tokio::test]
  async fn test_info_json_drops_empty_names() {
    let names = vec![String::new(), "wget".to_string(), "curl".to_string()];
    let out = echo_brew().info_json(&names).await.unwrap();
    assert_eq!(out.trim(), "info --json --variations wget curl");
  }

  #[tokio::test]
  async fn test_info_json_rejects_only_empty_names() {
    let err = echo_brew().info_json(&[String::new()]).await.unwrap_err();
    assert!(err.to_string().contains("empty or invalid"));
  }

  #[tokio::test]
  async fn test_cached_download_args() {
    let path = echo_brew()
      .cached_download(&BottleRef::tagged("wget", "x86_64_linux"))
      .await
      .unwrap();
    assert_eq!(path, "--cache --bottle-tag x86_64_linux wget");
  }

  #[tokio::test]
  async fn test_cached_download_passes_os_and_arch() {
    let platform = OsArch {
      os: Some("sonoma".to_string()),
      arch: Some("arm".to_string()),
    };
    let path = echo_brew()
      .cached_download(&BottleRef::host("wget").on(&platform))
      .await
      .unwrap();
    assert_eq!(path, "--cache --os sonoma --arch arm wget");
  }

  #[tokio::test]
  async fn test_fetch_reports_unavailable_bottle() {
    // Stand-in `brew` that warns the way a missing bottle does.
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("brew");
    std::fs::write(
      &script,
      "#!/bin/sh\necho 'Warning: Bottle for tag :arm64_sonoma is unavailable.' >&2\nexit 1\n",
    )
    .unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let brew = BrewCli::new(
      script.display().to_string(),
      ProcessRunner::new(Duration::from_secs(10)),
    );
    let fetched = brew
      .fetch_bottle(&BottleRef::tagged("wget", "arm64_sonoma"), false)
      .await
      .unwrap();
    assert_eq!(fetched, BottleFetch::Unavailable);
  }

  #[tokio::test]
  async fn test_fetch_success_is_fetched() {
    let fetched = echo_brew()
      .fetch_bottle(&BottleRef::host("wget"), true)
      .await
      .unwrap();
    assert_eq!(fetched, BottleFetch::Fetched);
  }

  #[tokio::test]
  async fn test_failing_brew_is_error_for_checked_calls() {
    let brew = BrewCli::new("false", ProcessRunner::new(Duration::from_secs(10)));
    assert!(brew.list_formulae().await.is_err());
    assert!(brew.fetch_bottle(&BottleRef::host("wget"), false).await.is_err());

    let out = brew.verify(&BottleRef::host("wget")).await.unwrap();
    assert!(!out.success);
  }

  #[test]
  fn test_lines_skips_blanks() {
    assert_eq!(lines("a\n\n  b \n"), vec!["a", "b"]);
  }
}

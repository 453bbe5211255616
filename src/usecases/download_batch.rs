//! Download Batch - Resumable Bottle Fetching for the Signing Workflow
//!
//! Each run takes the next window of `<formula> <bottle tag>` lines,
//! verifies (and thereby downloads) each bottle, and reports the cache
//! folder as an artifact glob for the upload step.
//!
//! Batch flow:
//! 1. Read the checkpoint (0 on first run)
//! 2. Slice `[start, start + num_lines)` from the tag list
//! 3. Verify each line's bottle, scraping the tarball path
//! 4. Advance the checkpoint only if some line succeeded

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::adapters::persistence::{read_lines, CheckpointStore};
use crate::domain::checkpoint::LineWindow;
use crate::domain::tag_list::TagLine;
use crate::domain::tarball::{artifact_glob, containing_folder, first_cached_tarball};
use crate::ports::package_manager::{BottleRef, PackageManager};

/// Summary of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
  /// Lines covered by this run.
  pub window: LineWindow,
  /// Well-formed lines attempted.
  pub attempted: usize,
  /// Lines whose bottle verified and reported a tarball.
  pub successful: usize,
  /// Malformed lines skipped.
  pub skipped: usize,
  /// `<folder>/*.tar.gz` of the first successful tarball.
  pub artifact_path: Option<String>,
  /// Whether the checkpoint moved to `window.end`.
  pub checkpoint_advanced: bool,
}

/// Resumable tag-list batch downloader.
pub struct BatchDownloader<P: PackageManager> {
  package_manager: Arc<P>,
  /// Lines per run.
  num_lines: usize,
}

impl<P: PackageManager> BatchDownloader<P> {
  pub fn new(package_manager: Arc<P>, num_lines: usize) -> Self {
    Self {
      package_manager,
      num_lines,
    }
  }

  /// Process the next window of `tag_file` and advance `checkpoint`.
  #[instrument(skip(self, checkpoint), fields(checkpoint = %checkpoint.path().display()))]
  pub async fn run(&self, checkpoint: &CheckpointStore, tag_file: &Path) -> Result<BatchReport> {
    let start = checkpoint.load().await?;
    let window = LineWindow::new(start, self.num_lines);
    let lines = read_lines(tag_file).await?;

    if window.is_exhausted(lines.len()) {
      info!(start, total = lines.len(), "Tag list exhausted, nothing to do");
    }

    let mut report = BatchReport {
      window,
      attempted: 0,
      successful: 0,
      skipped: 0,
      artifact_path: None,
      checkpoint_advanced: false,
    };
    let mut containing = None;

    for (offset, raw) in window.slice(&lines).iter().enumerate() {
      let lineno = window.start + offset;
      let line = match TagLine::parse(raw) {
        Ok(line) => line,
        Err(e) => {
          warn!(line = lineno, error = %e, "Skipping malformed tag line");
          report.skipped += 1;
          continue;
        }
      };

      report.attempted += 1;
      let bottle = BottleRef::tagged(line.formula, line.bottle_tag);
      let out = match self.package_manager.verify(&bottle).await {
        Ok(out) => out,
        Err(e) => {
          warn!(line = lineno, bottle = %bottle, error = %e, "Verification could not run");
          continue;
        }
      };

      if !out.success {
        debug!(line = lineno, bottle = %bottle, exit_code = ?out.exit_code, "Verification failed");
        continue;
      }

      if let Some(tarball) = first_cached_tarball(&out.stdout) {
        report.successful += 1;
        if containing.is_none() {
          containing = Some(containing_folder(tarball));
        }
      }
    }

    report.artifact_path = containing.as_deref().map(artifact_glob);

    if report.successful > 0 {
      checkpoint.save(window.end).await?;
      report.checkpoint_advanced = true;
    } else {
      warn!(start, "No bottle succeeded, checkpoint left unchanged");
    }

    info!(
      start = window.start,
      end = window.end,
      attempted = report.attempted,
      successful = report.successful,
      skipped = report.skipped,
      "Batch complete"
    );
    Ok(report)
  }
}

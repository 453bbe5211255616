//! Process Runner - Timed Subprocess Execution
//!
//! Spawns external tools with captured output and a hard timeout.
//! Children are killed when their future is dropped, so a timed-out
//! command never outlives the run.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::adapters::metrics::RunMetrics;
use crate::ports::package_manager::CommandOutput;

/// Why a command did not produce usable output.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` exited with status {}: {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()), stderr.trim())]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("`{command}` reported errors: {}", stderr.trim())]
    Stderr { command: String, stderr: String },
}

/// Subprocess launcher shared by the CLI adapters.
#[derive(Clone)]
pub struct ProcessRunner {
    /// Hard limit per command.
    timeout: Duration,
    /// Optional run metrics sink.
    metrics: Option<Arc<RunMetrics>>,
}

impl ProcessRunner {
    /// Create a runner with the given per-command timeout.
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            metrics: None,
        }
    }

    /// Record command counts and durations into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<RunMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run `program args…` to completion and capture its output.
    ///
    /// A non-zero exit is returned as `CommandOutput { success: false, .. }`.
    ///
    /// # Errors
    /// `Spawn` if the program could not be started, `Timeout` if it ran
    /// past the configured limit.
    #[instrument(skip(self, args), fields(command = %describe(program, args)))]
    pub async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let started = Instant::now();

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let result = match timeout(self.timeout, child).await {
            Err(_) => Err(CommandError::Timeout {
                command: describe(program, args),
                timeout: self.timeout,
            }),
            Ok(Err(source)) => Err(CommandError::Spawn {
                program: program.to_string(),
                source,
            }),
            Ok(Ok(output)) => Ok(CommandOutput {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        };

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(out) if out.success => "success",
                Ok(_) => "failure",
                Err(_) => "error",
            };
            metrics.record_command(program, outcome, elapsed);
        }

        match &result {
            Ok(out) => debug!(
                exit_code = ?out.exit_code,
                elapsed_ms = saturating_millis(elapsed),
                "Command finished"
            ),
            Err(e) => debug!(error = %e, "Command did not complete"),
        }

        result
    }

    /// Run and require exit status 0.
    ///
    /// # Errors
    /// Everything `run` returns, plus `NonZeroExit`.
    pub async fn run_checked(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        let out = self.run(program, args).await?;
        if out.success {
            Ok(out)
        } else {
            Err(CommandError::NonZeroExit {
                command: describe(program, args),
                code: out.exit_code,
                stderr: out.stderr,
            })
        }
    }

    /// Run, require exit status 0 and an empty stderr.
    ///
    /// # Errors
    /// Everything `run_checked` returns, plus `Stderr`.
    pub async fn run_strict(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        let out = self.run_checked(program, args).await?;
        if out.stderr.trim().is_empty() {
            Ok(out)
        } else {
            Err(CommandError::Stderr {
                command: describe(program, args),
                stderr: out.stderr,
            })
        }
    }
}

/// Whole milliseconds in `elapsed`, clamped to `u64::MAX`.
fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Render a command line for logs and errors.
pub fn describe(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let out = runner.run("sh", &sh("echo out; echo err >&2; exit 3")).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_run_checked_rejects_non_zero() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let err = runner.run_checked("sh", &sh("exit 2")).await.unwrap_err();
        assert!(matches!(err, CommandError::NonZeroExit { code: Some(2), .. }));
    }

    #[tokio::test]
    async fn test_run_strict_rejects_stderr() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let err = runner.run_strict("sh", &sh("echo warn >&2")).await.unwrap_err();
        assert!(matches!(err, CommandError::Stderr { .. }));
        assert!(err.to_string().contains("warn"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let runner = ProcessRunner::new(Duration::from_secs(10));
        let err = runner
            .run("definitely-not-a-real-binary-4242", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = ProcessRunner::new(Duration::from_millis(100));
        let err = runner.run("sh", &sh("sleep 5")).await.unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_records_metrics() {
        let metrics = Arc::new(RunMetrics::new().unwrap());
        let runner = ProcessRunner::new(Duration::from_secs(10)).with_metrics(Arc::clone(&metrics));
        runner.run("sh", &sh("exit 0")).await.unwrap();
        runner.run("sh", &sh("exit 1")).await.unwrap();

        assert_eq!(metrics.commands_total.with_label_values(&["sh", "success"]).get(), 1);
        assert_eq!(metrics.commands_total.with_label_values(&["sh", "failure"]).get(), 1);
    }

    #[test]
    fn test_describe() {
        let args = vec!["verify".to_string(), "wget".to_string()];
        assert_eq!(describe("brew", &args), "brew verify wget");
    }

    #[test]
    fn test_saturating_millis_clamps() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }
}

//! Prometheus Run Metrics - Pipeline Observability
//!
//! Collects per-run counters for every external command and every
//! formula classification. There is no server: one-shot runs dump the
//! registry to a node-exporter textfile at exit.

use std::path::Path;
use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use tracing::{info, instrument};

use crate::adapters::persistence::write_atomic;

/// Centralized Prometheus metrics for one pipeline run.
///
/// All metrics follow the naming convention `bottle_audit_*`.
pub struct RunMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// External commands by program and outcome (success/failure/error).
    pub commands_total: IntCounterVec,
    /// External command wall time in seconds.
    pub command_duration_seconds: HistogramVec,
    /// Formulae by classification (total/verified/unverified/errored/written).
    pub formulae: IntGaugeVec,
    /// Attestation checks by outcome status.
    pub attestations_total: IntCounterVec,
    /// Checkpoint line after the last batch run.
    pub checkpoint_line: IntGauge,
    /// Unix time the run finished.
    pub last_run_timestamp: IntGauge,
}

impl RunMetrics {
    /// Create and register all metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new(
                "bottle_audit_commands_total",
                "External commands run, by program and outcome",
            ),
            &["program", "outcome"],
        )?;

        let command_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "bottle_audit_command_duration_seconds",
                "External command wall time in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 1800.0]),
            &["program"],
        )?;

        let formulae = IntGaugeVec::new(
            Opts::new(
                "bottle_audit_formulae",
                "Formulae seen in this run, by classification",
            ),
            &["state"],
        )?;

        let attestations_total = IntCounterVec::new(
            Opts::new(
                "bottle_audit_attestations_total",
                "Bottle attestation checks, by outcome",
            ),
            &["status"],
        )?;

        let checkpoint_line = IntGauge::new(
            "bottle_audit_checkpoint_line",
            "Next tag-list line the batch downloader will process",
        )?;

        let last_run_timestamp = IntGauge::new(
            "bottle_audit_last_run_timestamp_seconds",
            "Unix time the last run finished",
        )?;

        // Register all metrics
        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(command_duration_seconds.clone()))?;
        registry.register(Box::new(formulae.clone()))?;
        registry.register(Box::new(attestations_total.clone()))?;
        registry.register(Box::new(checkpoint_line.clone()))?;
        registry.register(Box::new(last_run_timestamp.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            command_duration_seconds,
            formulae,
            attestations_total,
            checkpoint_line,
            last_run_timestamp,
        })
    }

    /// Count one finished command.
    pub fn record_command(&self, program: &str, outcome: &str, elapsed: Duration) {
        let program = Path::new(program)
            .file_name()
            .map_or_else(|| program.to_string(), |n| n.to_string_lossy().into_owned());
        self.commands_total
            .with_label_values(&[program.as_str(), outcome])
            .inc();
        self.command_duration_seconds
            .with_label_values(&[program.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Set the gauge for one formula classification.
    pub fn set_formulae(&self, state: &str, count: usize) {
        self.formulae
            .with_label_values(&[state])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Stamp the finish time and write the registry to `path` atomically.
    #[instrument(skip(self))]
    pub async fn write_textfile(&self, path: &Path) -> anyhow::Result<()> {
        self.last_run_timestamp.set(chrono::Utc::now().timestamp());
        let text = self.render()?;
        write_atomic(path, text.as_bytes()).await?;
        info!(path = %path.display(), "Run metrics written");
        Ok(())
    }
}

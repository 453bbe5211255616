//! Bottle Audit - Entry Point
//!
//! Operator CLI for finding and closing provenance gaps in bottles.
//! Each subcommand is one pipeline step; stdout carries the step's
//! output for the next step or the CI workflow, logs go to stderr.
//!
//! Wiring sequence:
//! 1. Parse flags, load the optional config file, apply overrides
//! 2. Init tracing (stderr, JSON or human-readable)
//! 3. Build the run metrics registry and the `brew`/`gh` adapters
//! 4. Run the subcommand's use case and print its output
//! 5. Write the metrics textfile when configured

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use bottle_audit::adapters::metrics::RunMetrics;
use bottle_audit::adapters::persistence::{CheckpointStore, SnapshotFormat, SnapshotStore};
use bottle_audit::adapters::process::{BrewCli, GhAttestation, ProcessRunner};
use bottle_audit::config::{self, AppConfig};
use bottle_audit::usecases::{
    filter_unverified, AttestRequest, Attestor, BatchDownloader, FormulaFetcher, TarballFinder,
    VerificationScanner,
};

/// Find and close provenance signing gaps in Homebrew bottles.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot bottle metadata for every formula in the catalog
    FetchFormulae {
        /// Snapshot to write (default: paths.formulae_snapshot)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Snapshot layout
        #[arg(long, value_enum, default_value_t = SnapshotFormat::Json)]
        format: SnapshotFormat,
    },

    /// Verify every formula in parallel and record the failures
    ScanUnverified {
        /// Snapshot to scan (default: paths.formulae_snapshot)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Unverified snapshot to write (default: paths.unverified_snapshot)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Name list to write (default: paths.unverified_names)
        #[arg(long)]
        names_output: Option<PathBuf>,
        /// Maximum concurrent verifications (default: scan.concurrency)
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Rebuild the unverified snapshot from a name list
    FilterUnverified {
        /// Full snapshot (default: paths.formulae_snapshot)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Name list, one formula per line (default: paths.unverified_names)
        #[arg(long)]
        names: Option<PathBuf>,
        /// Unverified snapshot to write (default: paths.unverified_snapshot)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List cached tarballs of bottle tags failing verification
    Tarballs {
        /// Snapshot to read formulae from (default: paths.unverified_snapshot)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Only these formulae (repeatable)
        #[arg(short, long = "formula")]
        formulae: Vec<String>,
        /// Also write `{name, paths}` records as JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify the next window of the tag list and print the artifact glob
    DownloadBatch {
        /// The file to read the starting line from and write the new ending line
        #[arg(long)]
        line_state_file: Option<PathBuf>,
        /// The number of lines to process
        #[arg(long)]
        num_lines: Option<usize>,
        /// The file to read the bottles and tags from
        #[arg(long)]
        bottle_tag_file: Option<PathBuf>,
    },

    /// Check build provenance attestations of bottles
    Attest {
        /// Formulae whose bottles are fetched and checked
        formulae: Vec<String>,
        /// Bottle files to check directly (repeatable)
        #[arg(long = "path")]
        paths: Vec<String>,
        /// Bottle tag to fetch
        #[arg(long)]
        bottle_tag: Option<String>,
        /// Operating system to fetch for (`all` for every OS)
        #[arg(long, conflicts_with = "bottle_tag")]
        os: Option<String>,
        /// CPU architecture to fetch for (`all` for every architecture)
        #[arg(long, conflicts_with = "bottle_tag")]
        arch: Option<String>,
        /// Also check every dependency of the named formulae
        #[arg(long)]
        deps: bool,
        /// Re-fetch bottles already in the cache
        #[arg(short, long)]
        force: bool,
        /// Signing repository (default: attestation.signing_repo)
        #[arg(short = 'R', long)]
        repo: Option<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let mut config = match config::loader::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }

    // ── 2. Initialize logging on stderr ─────────────────────
    init_tracing(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting bottle-audit");

    // ── 3. Run metrics ──────────────────────────────────────
    let metrics = match RunMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            error!(error = %e, "Failed to create metrics registry");
            return ExitCode::FAILURE;
        }
    };

    // ── 4. Run the subcommand ───────────────────────────────
    let code = match run(cli.command, &config, &metrics).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Run failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    };

    // ── 5. Export metrics ───────────────────────────────────
    if let Some(path) = &config.metrics.textfile {
        if let Err(e) = metrics.write_textfile(Path::new(path)).await {
            warn!(error = %e, "Failed to write metrics textfile");
        }
    }

    code
}

/// Initialize tracing on stderr; `RUST_LOG` overrides the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn brew(config: &AppConfig, metrics: &Arc<RunMetrics>) -> Arc<BrewCli> {
    let runner = ProcessRunner::new(Duration::from_secs(config.brew.timeout_seconds))
        .with_metrics(Arc::clone(metrics));
    Arc::new(BrewCli::new(config.brew.binary.clone(), runner))
}

fn path_or(flag: Option<PathBuf>, configured: &str) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(configured))
}

async fn run(command: Commands, config: &AppConfig, metrics: &Arc<RunMetrics>) -> Result<ExitCode> {
    match command {
        Commands::FetchFormulae { output, format } => {
            let store = SnapshotStore::new(path_or(output, &config.paths.formulae_snapshot));
            let fetcher = FormulaFetcher::new(
                brew(config, metrics),
                config.brew.info_batch_size,
                config.brew.tap_filter().map(str::to_string),
            );

            let report = fetcher
                .run(&store, format, |count| println!("Processing {count} formulae..."))
                .await
                .context("Error processing formulae")?;

            metrics.set_formulae("listed", report.formulae_listed);
            metrics.set_formulae("written", report.records_written);
            println!(
                "Successfully got bottle data for {} formulae.",
                report.records_written
            );
        }

        Commands::ScanUnverified {
            input,
            output,
            names_output,
            concurrency,
        } => {
            let input = SnapshotStore::new(path_or(input, &config.paths.formulae_snapshot));
            let output = SnapshotStore::new(path_or(output, &config.paths.unverified_snapshot));
            let names_output = path_or(names_output, &config.paths.unverified_names);
            let scanner = VerificationScanner::new(
                brew(config, metrics),
                concurrency.unwrap_or(config.scan.concurrency),
            );

            let report = scanner
                .run(&input, &output, Some(&names_output), |name| println!("{name}"))
                .await?;

            metrics.set_formulae("total", report.total);
            metrics.set_formulae("verified", report.verified);
            metrics.set_formulae("unverified", report.unverified.len());
            metrics.set_formulae("errored", report.errored.len());
        }

        Commands::FilterUnverified {
            input,
            names,
            output,
        } => {
            let input = SnapshotStore::new(path_or(input, &config.paths.formulae_snapshot));
            let names = path_or(names, &config.paths.unverified_names);
            let output = SnapshotStore::new(path_or(output, &config.paths.unverified_snapshot));

            let report = filter_unverified(&input, &names, &output).await?;

            metrics.set_formulae("total", report.total);
            metrics.set_formulae("unverified", report.unsigned);
            println!("total formulae: {}", report.total);
            println!("unsigned formulae: {}", report.unsigned);
        }

        Commands::Tarballs {
            input,
            formulae,
            output,
        } => {
            let input = SnapshotStore::new(path_or(input, &config.paths.unverified_snapshot));
            let finder = TarballFinder::new(brew(config, metrics), config.scan.concurrency);

            let found = finder.run(&input, &formulae, output.as_deref()).await?;
            for path in found.iter().flat_map(|f| &f.paths) {
                println!("{path}");
            }
        }

        Commands::DownloadBatch {
            line_state_file,
            num_lines,
            bottle_tag_file,
        } => {
            let checkpoint =
                CheckpointStore::new(path_or(line_state_file, &config.paths.line_state_file));
            let tag_file = path_or(bottle_tag_file, &config.paths.bottle_tag_file);
            let downloader = BatchDownloader::new(
                brew(config, metrics),
                num_lines.unwrap_or(config.download.num_lines),
            );

            let report = downloader.run(&checkpoint, &tag_file).await?;

            let next = if report.checkpoint_advanced {
                report.window.end
            } else {
                report.window.start
            };
            metrics.checkpoint_line.set(i64::try_from(next).unwrap_or(i64::MAX));
            if let Some(glob) = &report.artifact_path {
                println!("artifact_path={glob}");
            }
        }

        Commands::Attest {
            formulae,
            paths,
            bottle_tag,
            os,
            arch,
            deps,
            force,
            repo,
            json,
        } => {
            anyhow::ensure!(
                !formulae.is_empty() || !paths.is_empty(),
                "Name at least one formula or --path"
            );

            let runner = ProcessRunner::new(Duration::from_secs(config.attestation.timeout_seconds))
                .with_metrics(Arc::clone(metrics));
            let gh = Arc::new(GhAttestation::new(config.attestation.gh_binary.clone(), runner));
            let signing_repo = repo.unwrap_or_else(|| config.attestation.signing_repo.clone());
            let attestor = Attestor::new(brew(config, metrics), gh, signing_repo);

            let request = AttestRequest {
                formulae,
                paths,
                bottle_tag,
                os,
                arch,
                deps,
                force,
            };
            let report = attestor
                .run(&request, |checked| {
                    metrics
                        .attestations_total
                        .with_label_values(&[checked.outcome.status()])
                        .inc();
                    if !json {
                        println!("{}: {}", checked.path, checked.outcome);
                    }
                })
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for bottle in &report.skipped {
                    println!("{bottle}: skipped (bottle unavailable)");
                }
                for (target, reason) in &report.failed {
                    println!("{target}: not checked ({reason})");
                }
            }

            if !report.all_verified() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

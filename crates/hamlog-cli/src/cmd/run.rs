//! `hamlog run` - process contact logs end to end

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use hamlog_contacts::{EnrichConfig, Outcome};
use hamlog_core::SharedProgress;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log files or glob patterns (.gz is read transparently)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Call sign prefix table
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lookup service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Number of dataset partitions
    #[arg(short, long)]
    pub partitions: Option<usize>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum lookups in flight per partition
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Per-lookup timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Count lines mentioning this call sign
    #[arg(long)]
    pub watch: Option<String>,

    /// Stop after writing country counts
    #[arg(long)]
    pub skip_enrich: bool,
}

impl RunArgs {
    /// Merge flags over file configuration
    fn into_config(self, config: &Config) -> hamlog_contacts::Config {
        hamlog_contacts::Config {
            inputs: self.inputs,
            table: self.table.unwrap_or_else(|| config.input.table.clone()),
            output_dir: self
                .output
                .unwrap_or_else(|| config.output.default_dir.clone()),
            watch_sign: self
                .watch
                .unwrap_or_else(|| config.input.watch_sign.clone()),
            partitions: self.partitions.unwrap_or(config.workers.partitions).max(1),
            workers: self.workers.unwrap_or(config.workers.default).max(1),
            max_invalid_percent: config.gate.max_invalid_percent,
            enrich: EnrichConfig {
                base_url: self
                    .base_url
                    .unwrap_or_else(|| config.enrich.base_url.clone()),
                max_concurrency: self
                    .max_concurrency
                    .unwrap_or(config.enrich.max_concurrency)
                    .max(1),
                timeout: Duration::from_secs(
                    self.timeout_secs.unwrap_or(config.enrich.timeout_secs),
                ),
            },
            skip_enrich: self.skip_enrich,
        }
    }
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    hamlog_core::install_signal_handlers().context("Failed to install signal handlers")?;

    let run_config = args.into_config(config);
    log::info!("Processing {} input patterns", run_config.inputs.len());
    log::info!("  Table: {}", run_config.table.display());
    log::info!("  Output: {}", run_config.output_dir.display());
    if !run_config.skip_enrich {
        log::info!("  Lookup service: {}", run_config.enrich.base_url);
    }

    let report = hamlog_contacts::run(&run_config, progress)?;

    if progress.is_tty() {
        eprintln!("\n{}", report.summary.format_table());
    } else {
        report.summary.log();
    }

    if let Some(notice) = outcome_notice(&report.outcome) {
        eprintln!("\n{notice}");
    }
    Ok(ExitCode::from(report.outcome.exit_code()))
}

/// Diagnostic printed to stderr regardless of the log filter
fn outcome_notice(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Completed => None,
        Outcome::GateTripped { invalid, valid } => {
            Some(format!("Too many errors {invalid} for {valid}"))
        }
        Outcome::Interrupted => {
            Some("Interrupted; rerun to produce complete lookup results.".to_string())
        }
    }
}

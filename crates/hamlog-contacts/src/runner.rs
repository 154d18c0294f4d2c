//! Main runner for the contact pipeline
//!
//! read → tokenize → callsigns → validate → aggregate → gate → contacts →
//! rekey → countries → enrich → qsos

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use hamlog_core::{
    Counter, LineSink, Partitions, PipelineCounters, ProgressContext, SharedCounters,
    expand_inputs, fmt_num, read_lines, write_partitions,
};

use crate::aggregate::{Aggregate, par_aggregate, par_rekey};
use crate::config::Config;
use crate::enrich::{Connector, HttpConnector, LookupPair, PartitionEnricher};
use crate::gate::{GateVerdict, check_gate};
use crate::stats::{OutputStats, RunSummary};
use crate::table::{CallSignTable, SharedTable};
use crate::validate::{CallSignValidator, LineScanner};

pub const CALLSIGNS_DIR: &str = "callsigns";
pub const CONTACTS_DIR: &str = "contacts";
pub const COUNTRIES_DIR: &str = "countries";
pub const QSOS_DIR: &str = "qsos";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Too many invalid tokens; only `callsigns` was written
    GateTripped { invalid: u64, valid: u64 },
    /// Shutdown was requested during enrichment; `qsos` is partial
    Interrupted,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::GateTripped { .. } => 1,
            Self::Interrupted => 130,
        }
    }
}

/// Pipeline execution report
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: Outcome,
    pub summary: RunSummary,
}

/// Run the contact pipeline against the HTTP lookup service
pub fn run(config: &Config, progress: &ProgressContext) -> Result<RunReport> {
    run_with(config, HttpConnector::new(config.enrich.clone()), progress)
}

/// Run the contact pipeline with a caller-supplied lookup connector
pub fn run_with<C: Connector>(
    config: &Config,
    connector: C,
    progress: &ProgressContext,
) -> Result<RunReport> {
    let counters = PipelineCounters::shared();
    let enricher = PartitionEnricher::new(connector, config.enrich.clone(), counters.clone());
    run_enricher(config, &enricher, counters, progress)
}

/// Run with a prepared enricher; `counters` must be the enricher's own
pub fn run_enricher<C: Connector>(
    config: &Config,
    enricher: &PartitionEnricher<C>,
    counters: SharedCounters,
    progress: &ProgressContext,
) -> Result<RunReport> {
    let start = Instant::now();

    let table: SharedTable = Arc::new(
        CallSignTable::load(&config.table)
            .with_context(|| format!("Failed to load call sign table {}", config.table.display()))?,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("hamlog-worker-{i}"))
        .build()
        .context("Failed to create thread pool")?;
    log::info!(
        "Processing with {} workers over {} partitions",
        config.workers,
        config.partitions
    );

    let mut report = pool.install(|| execute(config, enricher, &table, &counters, progress))?;
    report.summary.counters = counters.snapshot();
    report.summary.elapsed = start.elapsed();
    Ok(report)
}

fn write_output<T, F>(root: &Path, name: &'static str, parts: &[Vec<T>], write: F) -> Result<OutputStats>
where
    T: Sync,
    F: Fn(&mut LineSink, &T) -> io::Result<()> + Sync,
{
    let dir = root.join(name);
    let lines = write_partitions(&dir, parts, write)
        .with_context(|| format!("Failed to write {}", dir.display()))?;
    log::info!("{name}: {} lines -> {}", fmt_num(lines as u64), dir.display());
    Ok(OutputStats { name, dir, lines })
}

fn execute<C: Connector>(
    config: &Config,
    enricher: &PartitionEnricher<C>,
    table: &CallSignTable,
    counters: &PipelineCounters,
    progress: &ProgressContext,
) -> Result<RunReport> {
    let root = config.output_dir.as_path();
    let mut summary = RunSummary::default();

    // Read
    let pb = progress.stage_line("read");
    let files = expand_inputs(&config.inputs).context("Failed to resolve inputs")?;
    pb.set_message(format!("{} files", files.len()));
    let lines = read_lines(&files).context("Failed to read input")?;
    summary.input_files = files.len();
    summary.input_lines = lines.len();
    log::info!(
        "Read {} lines from {} files",
        fmt_num(lines.len() as u64),
        files.len()
    );
    let lines = Partitions::chunked(lines, config.partitions);
    pb.finish_with_message(format!("{} lines", fmt_num(summary.input_lines as u64)));

    // Tokenize
    let scanner = LineScanner::new(&config.watch_sign, counters);
    let tokens: Partitions<&str> = lines.flat_map_partitions(|_, part| {
        part.iter().flat_map(|line| scanner.scan(line)).collect()
    });
    summary
        .outputs
        .push(write_output(root, CALLSIGNS_DIR, tokens.parts(), |sink, t| {
            sink.write_line(t)
        })?);

    // Validate + aggregate
    let pb = progress.stage_line("validate");
    let validator = CallSignValidator::new(counters);
    let valid: Partitions<&str> = tokens.flat_map_partitions(|_, part| {
        part.iter().copied().filter(|t| validator.validate(t)).collect()
    });
    let contacts = par_aggregate(&valid);
    let (n_valid, n_invalid) = (
        counters.value(Counter::ValidSigns),
        counters.value(Counter::InvalidSigns),
    );
    pb.finish_with_message(format!(
        "{} valid, {} invalid, {} distinct",
        fmt_num(n_valid),
        fmt_num(n_invalid),
        fmt_num(contacts.len() as u64)
    ));
    log::info!(
        "Validated {} tokens: {} valid, {} distinct call signs",
        fmt_num(n_valid + n_invalid),
        fmt_num(n_valid),
        fmt_num(contacts.len() as u64)
    );

    // Gate
    if let GateVerdict::Abort { invalid, valid } =
        check_gate(n_valid, n_invalid, config.max_invalid_percent)
    {
        log::info!("Gate tripped ({invalid} invalid, {valid} valid), skipping remaining stages");
        return Ok(RunReport {
            outcome: Outcome::GateTripped { invalid, valid },
            summary,
        });
    }

    let contacts = Partitions::by_key(contacts, config.partitions, |a: &Aggregate| {
        a.key.as_str()
    });
    summary
        .outputs
        .push(write_output(root, CONTACTS_DIR, contacts.parts(), |sink, a| {
            sink.write_json(a)
        })?);

    // Rekey by country
    let pb = progress.stage_line("countries");
    let countries = par_rekey(&contacts, table);
    pb.finish_with_message(format!("{} countries", countries.len()));
    let countries = Partitions::by_key(countries, config.partitions, |a: &Aggregate| {
        a.key.as_str()
    });
    summary
        .outputs
        .push(write_output(root, COUNTRIES_DIR, countries.parts(), |sink, a| {
            sink.write_json(a)
        })?);

    if config.skip_enrich {
        log::info!("Skipping enrichment");
        return Ok(RunReport {
            outcome: Outcome::Completed,
            summary,
        });
    }

    // Enrich; contacts are already partitioned by key
    let pairs: Partitions<LookupPair> = contacts.flat_map_partitions(|_, part| {
        part.iter().map(|a| (a.key.clone(), a.key.clone())).collect()
    });
    log::info!(
        "Enriching {} call signs across {} partitions (up to {} requests in flight each)",
        fmt_num(pairs.total_len() as u64),
        pairs.len(),
        enricher.config().max_concurrency
    );
    let pb = progress.partition_bar("enrich", pairs.len());
    let enriched = enricher.enrich_all(&pairs, &pb);
    pb.finish_and_clear();
    log::info!(
        "Enriched {} of {} call signs ({} failed)",
        fmt_num(enriched.total_len() as u64),
        fmt_num(pairs.total_len() as u64),
        fmt_num(counters.value(Counter::FailedLookups))
    );
    summary
        .outputs
        .push(write_output(root, QSOS_DIR, enriched.parts(), |sink, r| {
            sink.write_json(r)
        })?);

    let outcome = if enricher.stop_requested() {
        log::warn!(
            "Interrupted: {} lookups skipped",
            fmt_num(counters.value(Counter::SkippedLookups))
        );
        Outcome::Interrupted
    } else {
        Outcome::Completed
    };
    Ok(RunReport { outcome, summary })
}

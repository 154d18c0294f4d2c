//! End-to-end tests for the contact pipeline with an in-process lookup service

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use hamlog_contacts::{
    Config, Connector, EnrichConfig, LookupClient, Outcome, PartitionEnricher, run_enricher,
    run_with,
};
use hamlog_core::{Counter, FetchError, PipelineCounters, ProgressContext, is_complete};

const TABLE: &str = "\
3DA,Swaziland
K,United States
KH6,Hawaii
VE,Canada
W,United States
";

/// Answers every id with one QSO, except ids listed in `fail`
struct StaticConnector {
    fail: &'static [&'static str],
}

struct StaticClient {
    fail: &'static [&'static str],
}

impl Connector for StaticConnector {
    type Client = StaticClient;

    fn connect(&self, _partition: usize) -> Result<StaticClient, FetchError> {
        Ok(StaticClient { fail: self.fail })
    }
}

impl LookupClient for StaticClient {
    async fn fetch(&self, id: &str) -> Result<String, FetchError> {
        if self.fail.iter().any(|f| *f == id) {
            return Err(FetchError::Http {
                status: Some(404),
                message: "not found".into(),
            });
        }
        Ok(format!(
            r#"[{{"mycallsign":"{id}","contactsign":"KK6JKQ","band":"20m"}}]"#
        ))
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("table"), TABLE).unwrap();
        Self { dir }
    }

    fn write_log(&self, name: &str, lines: &[&str]) -> String {
        let path = self.dir.path().join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path.display().to_string()
    }

    fn config(&self, inputs: Vec<String>) -> Config {
        Config {
            inputs,
            table: self.dir.path().join("table"),
            output_dir: self.out(),
            partitions: 3,
            workers: 2,
            ..Default::default()
        }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }
}

/// All lines of all part files in an output directory, sorted
fn read_output(dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if name.starts_with("part-") {
            let content = std::fs::read_to_string(&path).unwrap();
            lines.extend(content.lines().map(str::to_string));
        }
    }
    lines.sort();
    lines
}

fn part_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("part-")
        })
        .count()
}

const CLEAN_LOG: &[&str] = &[
    "KK6JKQ W1AW",
    "W1AW K1ABC",
    "VE3XYZ W1AW",
    "KH6BB KK6JKQ",
    "3DA0RS K1ABC",
];

#[test]
fn small_log_trips_gate() {
    let fx = Fixture::new();
    let input = fx.write_log("sample.log", &["KK6JKQ is here", "", "W1AW 599"]);
    let config = fx.config(vec![input]);

    let report = run_with(
        &config,
        StaticConnector { fail: &[] },
        &ProgressContext::hidden(),
    )
    .unwrap();

    let counters = report.summary.counters;
    assert_eq!(counters.get(Counter::BlankLines), 1);
    assert_eq!(counters.get(Counter::MatchingLines), 1);
    assert_eq!(counters.get(Counter::ValidSigns), 2);
    assert_eq!(counters.get(Counter::InvalidSigns), 4);
    assert_eq!(
        report.outcome,
        Outcome::GateTripped {
            invalid: 4,
            valid: 2
        }
    );
    assert_eq!(report.outcome.exit_code(), 1);

    let tokens = read_output(&fx.out().join("callsigns"));
    for t in ["KK6JKQ", "is", "here", "W1AW", "599", ""] {
        assert!(tokens.iter().any(|x| x == t), "missing token {t:?}");
    }
    assert!(!fx.out().join("contacts").exists());
    assert!(!fx.out().join("countries").exists());
    assert!(!fx.out().join("qsos").exists());
}

#[test]
fn clean_log_runs_every_stage() {
    let fx = Fixture::new();
    let input = fx.write_log("clean.log", CLEAN_LOG);
    let config = fx.config(vec![input]);

    let report = run_with(
        &config,
        StaticConnector { fail: &["VE3XYZ"] },
        &ProgressContext::hidden(),
    )
    .unwrap();

    assert_eq!(report.outcome, Outcome::Completed);
    let counters = report.summary.counters;
    assert_eq!(counters.get(Counter::ValidSigns), 10);
    assert_eq!(counters.get(Counter::InvalidSigns), 0);
    assert_eq!(counters.get(Counter::MatchingLines), 2);
    assert_eq!(counters.get(Counter::EnrichedKeys), 5);
    assert_eq!(counters.get(Counter::FailedLookups), 1);

    for name in ["callsigns", "contacts", "countries", "qsos"] {
        let dir = fx.out().join(name);
        assert!(is_complete(&dir), "{name} not marked complete");
        assert_eq!(part_files(&dir), 3, "{name} part count");
    }

    assert_eq!(
        read_output(&fx.out().join("contacts")),
        vec![
            r#"{"key":"3DA0RS","count":1}"#,
            r#"{"key":"K1ABC","count":2}"#,
            r#"{"key":"KH6BB","count":1}"#,
            r#"{"key":"KK6JKQ","count":2}"#,
            r#"{"key":"VE3XYZ","count":1}"#,
            r#"{"key":"W1AW","count":3}"#,
        ]
    );
    assert_eq!(
        read_output(&fx.out().join("countries")),
        vec![
            r#"{"key":"Canada","count":1}"#,
            r#"{"key":"Hawaii","count":3}"#,
            r#"{"key":"Swaziland","count":1}"#,
            r#"{"key":"United States","count":5}"#,
        ]
    );

    let qsos = read_output(&fx.out().join("qsos"));
    assert_eq!(qsos.len(), 5);
    assert!(qsos.iter().all(|l| !l.contains("VE3XYZ")));
    assert!(qsos.contains(
        &r#"{"key":"W1AW","qsos":[{"mycallsign":"W1AW","contactsign":"KK6JKQ","band":"20m"}]}"#
            .to_string()
    ));
}

#[test]
fn non_utf8_line_counted_invalid() {
    let fx = Fixture::new();
    let path = fx.dir.path().join("latin1.log");
    let mut bytes = CLEAN_LOG.join("\n").into_bytes();
    bytes.extend_from_slice(b"\nW1AW Jos\xe9 \n");
    std::fs::write(&path, bytes).unwrap();
    let mut config = fx.config(vec![path.display().to_string()]);
    config.skip_enrich = true;

    let report = run_with(
        &config,
        StaticConnector { fail: &[] },
        &ProgressContext::hidden(),
    )
    .unwrap();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.summary.input_lines, 6);
    let counters = report.summary.counters;
    assert_eq!(counters.get(Counter::ValidSigns), 11);
    assert_eq!(counters.get(Counter::InvalidSigns), 1);
    assert!(
        read_output(&fx.out().join("contacts")).contains(&r#"{"key":"W1AW","count":4}"#.to_string())
    );
    assert!(is_complete(&fx.out().join("countries")));
}

#[test]
fn gzip_and_glob_inputs() {
    let fx = Fixture::new();
    fx.write_log("a.log", &CLEAN_LOG[..2]);
    let gz = std::fs::File::create(fx.dir.path().join("b.log.gz")).unwrap();
    let mut enc = GzEncoder::new(gz, Compression::default());
    enc.write_all(CLEAN_LOG[2..].join("\n").as_bytes()).unwrap();
    enc.finish().unwrap();

    let pattern = fx.dir.path().join("*.log*").display().to_string();
    let mut config = fx.config(vec![pattern]);
    config.skip_enrich = true;

    let report = run_with(
        &config,
        StaticConnector { fail: &[] },
        &ProgressContext::hidden(),
    )
    .unwrap();

    assert_eq!(report.summary.input_files, 2);
    assert_eq!(report.summary.input_lines, 5);
    assert_eq!(report.summary.counters.get(Counter::ValidSigns), 10);
    assert!(is_complete(&fx.out().join("countries")));
    assert!(!fx.out().join("qsos").exists());
}

#[test]
fn rerun_replaces_previous_parts() {
    let fx = Fixture::new();
    let input = fx.write_log("clean.log", CLEAN_LOG);
    let mut config = fx.config(vec![input]);
    config.skip_enrich = true;
    config.partitions = 6;
    run_with(&config, StaticConnector { fail: &[] }, &ProgressContext::hidden()).unwrap();
    assert_eq!(part_files(&fx.out().join("countries")), 6);

    config.partitions = 2;
    run_with(&config, StaticConnector { fail: &[] }, &ProgressContext::hidden()).unwrap();
    assert_eq!(part_files(&fx.out().join("countries")), 2);
    assert_eq!(read_output(&fx.out().join("countries")).len(), 4);
}

#[test]
fn stop_flag_interrupts_enrichment() {
    let fx = Fixture::new();
    let input = fx.write_log("clean.log", CLEAN_LOG);
    let config = fx.config(vec![input]);

    let counters = PipelineCounters::shared();
    let stop: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(true)));
    let enricher = PartitionEnricher::new(
        StaticConnector { fail: &[] },
        EnrichConfig::default(),
        counters.clone(),
    )
    .with_stop_flag(stop);

    let report = run_enricher(&config, &enricher, counters, &ProgressContext::hidden()).unwrap();

    assert_eq!(report.outcome, Outcome::Interrupted);
    assert_eq!(report.outcome.exit_code(), 130);
    assert_eq!(report.summary.counters.get(Counter::SkippedLookups), 6);
    assert!(is_complete(&fx.out().join("countries")));
    assert!(read_output(&fx.out().join("qsos")).is_empty());
}

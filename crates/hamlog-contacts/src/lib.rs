//! Hamlog Contacts - Amateur radio contact log pipeline
//!
//! Reads contact logs, validates call signs, counts contacts per call sign
//! and per country, then enriches each call sign with its QSO history from
//! a lookup service.
//!
//! # Features
//!
//! - Nearest-floor prefix lookup over a sorted call sign table
//! - Parallel partitions with rayon, shared atomic counters
//! - Bounded-concurrency async lookups with per-key failure isolation
//!
//! # Example
//!
//! ```ignore
//! use hamlog_contacts::{Config, run};
//! use hamlog_core::ProgressContext;
//!
//! let config = Config {
//!     inputs: vec!["logs/*.log".into()],
//!     ..Default::default()
//! };
//!
//! let report = run(&config, &ProgressContext::new())?;
//! report.summary.log();
//! ```

pub mod aggregate;
pub mod config;
pub mod enrich;
pub mod gate;
pub mod qso;
pub mod runner;
pub mod stats;
pub mod table;
pub mod validate;

// Re-exports
pub use aggregate::{Aggregate, aggregate, par_aggregate, par_rekey, rekey_and_reaggregate};
pub use config::Config;
pub use enrich::{
    Connector, EnrichConfig, HttpConnector, HttpLookupClient, LookupClient, LookupPair,
    PartitionEnricher,
};
pub use gate::{GateVerdict, check_gate};
pub use qso::{EnrichedResult, Qso, decode_qsos};
pub use runner::{Outcome, RunReport, run, run_enricher, run_with};
pub use stats::{OutputStats, RunSummary};
pub use table::{CallSignTable, SharedTable, TableEntry, TableError};
pub use validate::{CallSignValidator, LineScanner, is_call_sign, split_line};

//! Contact pipeline configuration

use std::path::PathBuf;

use crate::enrich::EnrichConfig;
use crate::gate::DEFAULT_MAX_INVALID_PERCENT;

/// Runtime configuration for the contact pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Log files or glob patterns (`.gz` allowed)
    pub inputs: Vec<String>,
    /// Call sign prefix table
    pub table: PathBuf,
    /// Root for the `callsigns`, `contacts`, `countries`, `qsos` outputs
    pub output_dir: PathBuf,
    /// Lines containing this sign are counted; empty disables
    pub watch_sign: String,
    /// Number of dataset partitions
    pub partitions: usize,
    /// Rayon worker threads
    pub workers: usize,
    pub max_invalid_percent: u64,
    pub enrich: EnrichConfig,
    /// Stop after writing country counts
    pub skip_enrich: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            table: PathBuf::from("./files/callsign_tbl_sorted"),
            output_dir: PathBuf::from("./out"),
            watch_sign: "KK6JKQ".to_string(),
            partitions: 4,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .min(8),
            max_invalid_percent: DEFAULT_MAX_INVALID_PERCENT,
            enrich: EnrichConfig::default(),
            skip_enrich: false,
        }
    }
}

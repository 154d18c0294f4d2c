//! Hamlog Core - Common infrastructure for contact-log pipelines
//!
//! This crate provides the pieces every stage leans on: partitioned
//! execution, shared counters, line input, part-file output, HTTP
//! plumbing, progress and logging.

pub mod counters;
pub mod http;
pub mod input;
pub mod logging;
pub mod partition;
pub mod progress;
pub mod shutdown;
pub mod sink;

// Re-exports for convenience
pub use counters::{Counter, CounterSnapshot, PipelineCounters, SharedCounters};
pub use http::{FetchError, SHARED_RUNTIME, build_client};
pub use input::{expand_inputs, open_lines, read_lines};
pub use logging::{IndicatifLogger, init_logging};
pub use partition::Partitions;
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use shutdown::{install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag};
pub use sink::{LineSink, cleanup_tmp_files, is_complete, mark_success, prepare_output_dir, write_partitions};

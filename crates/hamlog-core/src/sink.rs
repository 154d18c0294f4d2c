//! Output sinks: line-oriented part files with atomic tmp→rename
//!
//! Every output is a directory holding `part-NNNNN` files (one per
//! partition) and a `_SUCCESS` marker written once all parts are in place.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

/// Marker file written after every part of an output has been finalized
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Buffered writer for one part file
pub struct LineSink {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    line_count: usize,
}

impl std::fmt::Debug for LineSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSink")
            .field("final_path", &self.final_path)
            .field("line_count", &self.line_count)
            .finish_non_exhaustive()
    }
}

impl LineSink {
    /// Create a sink for partition `part_idx`, writing to a temporary file
    pub fn new(output_dir: &Path, part_idx: usize) -> io::Result<Self> {
        let filename = format!("part-{part_idx:05}");
        let final_path = output_dir.join(&filename);
        let tmp_path = output_dir.join(format!("{filename}.tmp"));

        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let writer = BufWriter::new(File::create(&tmp_path)?);
        Ok(Self {
            writer,
            tmp_path,
            final_path,
            line_count: 0,
        })
    }

    /// Write one line (a trailing newline is added)
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.line_count += 1;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    /// Write one value as a JSON line
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        self.line_count += 1;
        serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")
    }

    /// Flush and atomically rename tmp → final
    pub fn finalize(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(self.line_count)
    }
}

/// Create `output_dir` and clear leftovers from a previous run.
///
/// Stale `.tmp` files, old `part-*` files and the success marker are removed
/// so a rerun never mixes parts from two runs.
pub fn prepare_output_dir(output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    cleanup_tmp_files(output_dir)?;
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("part-") || name == SUCCESS_MARKER {
            log::debug!("Removing previous output: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Write the success marker
pub fn mark_success(output_dir: &Path) -> io::Result<()> {
    File::create(output_dir.join(SUCCESS_MARKER)).map(|_| ())
}

/// Whether an output directory has been fully written
pub fn is_complete(output_dir: &Path) -> bool {
    output_dir.join(SUCCESS_MARKER).is_file()
}

/// Write one part file per partition in parallel, then mark success.
///
/// Returns the total number of lines written.
pub fn write_partitions<T, F>(output_dir: &Path, parts: &[Vec<T>], write: F) -> io::Result<usize>
where
    T: Sync,
    F: Fn(&mut LineSink, &T) -> io::Result<()> + Sync,
{
    prepare_output_dir(output_dir)?;
    let lines = parts
        .par_iter()
        .enumerate()
        .map(|(idx, part)| {
            let mut sink = LineSink::new(output_dir, idx)?;
            for item in part {
                write(&mut sink, item)?;
            }
            sink.finalize()
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;
    mark_success(output_dir)?;
    log::debug!(
        "{}: {} lines in {} parts",
        output_dir.display(),
        lines,
        parts.len()
    );
    Ok(lines)
}

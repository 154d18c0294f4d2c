//! Line input from local files, plain or gzip-compressed.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

/// Buffer size for input readers (256KB)
const INPUT_BUF_SIZE: usize = 256 * 1024;

/// Boxed line reader over either a plain or a gunzipped file
pub type LineReader = Box<dyn BufRead + Send>;

/// Expand paths and glob patterns into a sorted, de-duplicated file list.
///
/// Entries without glob metacharacters are taken literally and must exist.
/// A pattern that matches nothing is an error.
pub fn expand_inputs(patterns: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("input not found: {pattern}"),
                ));
            }
            paths.push(path);
            continue;
        }
        let before = paths.len();
        let entries = glob::glob(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        for entry in entries {
            let path = entry.map_err(|e| io::Error::other(e.to_string()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no input files match {pattern}"),
            ));
        }
    }
    paths.sort();
    paths.dedup();
    log::debug!("{} input files", paths.len());
    Ok(paths)
}

/// Open a file for line reading, gunzipping `.gz` files transparently
pub fn open_lines(path: &Path) -> io::Result<LineReader> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::with_capacity(
            INPUT_BUF_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(INPUT_BUF_SIZE, file)))
    }
}

/// Read every line of every file, in file order.
///
/// Line terminators (`\n` or `\r\n`) are stripped; a final line without a
/// terminator is kept. Bytes that are not UTF-8 decode to U+FFFD.
pub fn read_lines(paths: &[PathBuf]) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    for path in paths {
        let mut reader = open_lines(path)?;
        let before = lines.len();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                log::debug!(
                    "{}:{}: invalid UTF-8, decoded lossily",
                    path.display(),
                    lines.len() - before + 1
                );
            }
            lines.push(line.into_owned());
        }
        log::debug!("{}: {} lines", path.display(), lines.len() - before);
    }
    Ok(lines)
}

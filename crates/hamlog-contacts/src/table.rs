//! Call sign prefix table with nearest-floor lookup.
//!
//! The table is loaded once, sorted by range key, then shared read-only
//! (`Arc<CallSignTable>`) with every partition. Lookups are two binary
//! searches and need no synchronization.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One `rangeKey,payload...` row of the reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub range_key: String,
    /// Columns after the range key; never empty
    pub payload: Vec<String>,
}

impl TableEntry {
    /// Country column (`key,country,...`), empty for a hand-built entry
    /// without payload
    pub fn country(&self) -> &str {
        self.payload.first().map_or("", String::as_str)
    }
}

/// Reference table load failure
#[derive(Debug)]
pub enum TableError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        line: usize,
        reason: &'static str,
        content: String,
    },
    Empty,
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Malformed {
                line,
                reason,
                content,
            } => write!(f, "line {line}: {reason}: {content:?}"),
            Self::Empty => write!(f, "call sign table has no entries"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Immutable, sorted call sign table
#[derive(Debug, Clone)]
pub struct CallSignTable {
    entries: Vec<TableEntry>,
}

/// Table handle given to every partition
pub type SharedTable = Arc<CallSignTable>;

fn parse_entry(line_no: usize, line: &str) -> Result<TableEntry, TableError> {
    let malformed = |reason| TableError::Malformed {
        line: line_no,
        reason,
        content: line.to_string(),
    };
    let mut fields = line.split(',');
    let range_key = fields.next().unwrap_or_default().trim();
    if range_key.is_empty() {
        return Err(malformed("empty range key"));
    }
    let payload: Vec<String> = fields.map(|f| f.trim().to_string()).collect();
    match payload.first() {
        None => Err(malformed("missing country column")),
        Some(country) if country.is_empty() => Err(malformed("empty country column")),
        Some(_) => Ok(TableEntry {
            range_key: range_key.to_string(),
            payload,
        }),
    }
}

impl CallSignTable {
    /// Parse table lines. Blank lines are skipped; any other malformed line
    /// fails the whole load.
    pub fn build<I, S>(lines: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_entry(idx + 1, line)?);
        }
        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        if !entries.windows(2).all(|w| w[0].range_key <= w[1].range_key) {
            log::warn!("Call sign table is not sorted, sorting {} entries", entries.len());
            // stable: duplicates keep file order, so the first one still wins
            entries.sort_by(|a, b| a.range_key.cmp(&b.range_key));
        }
        Ok(Self { entries })
    }

    /// Read and build the table from a file
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::build(content.lines())?;
        log::info!("Loaded {} call sign prefixes from {}", table.len(), path.display());
        Ok(table)
    }

    /// Entry with the greatest range key ≤ `key`, or the first entry when
    /// every range key is greater. Among equal range keys the first wins.
    pub fn lookup(&self, key: &str) -> &TableEntry {
        let upper = self
            .entries
            .partition_point(|e| e.range_key.as_str() <= key);
        if upper == 0 {
            return &self.entries[0];
        }
        let floor = self.entries[upper - 1].range_key.as_str();
        let first = self
            .entries
            .partition_point(|e| e.range_key.as_str() < floor);
        &self.entries[first]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built table; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }
}

//! Shared add-only counters for pipeline stages.
//!
//! Counters are bumped from many rayon workers at once and read by the
//! driver afterwards. A value is only meaningful once the stage feeding it
//! has joined; reading while partitions are still running returns whatever
//! subset of increments has landed so far.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Named counters tracked across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Lines containing the watched call sign
    MatchingLines,
    /// Empty input lines
    BlankLines,
    /// Tokens accepted by the call sign grammar
    ValidSigns,
    /// Tokens rejected by the call sign grammar
    InvalidSigns,
    /// Keys that came back from the lookup service with a decodable body
    EnrichedKeys,
    /// Lookups lost to network errors, timeouts, bad status or bad JSON
    FailedLookups,
    /// Lookups never submitted because shutdown was requested
    SkippedLookups,
}

const COUNTER_SLOTS: usize = 7;

impl Counter {
    pub const ALL: [Counter; COUNTER_SLOTS] = [
        Counter::MatchingLines,
        Counter::BlankLines,
        Counter::ValidSigns,
        Counter::InvalidSigns,
        Counter::EnrichedKeys,
        Counter::FailedLookups,
        Counter::SkippedLookups,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Human-readable label used in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::MatchingLines => "Matching lines",
            Self::BlankLines => "Blank lines",
            Self::ValidSigns => "Valid call signs",
            Self::InvalidSigns => "Invalid call signs",
            Self::EnrichedKeys => "Enriched keys",
            Self::FailedLookups => "Failed lookups",
            Self::SkippedLookups => "Skipped lookups",
        }
    }
}

/// Process-wide counters with atomic-add discipline.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    slots: [AtomicU64; COUNTER_SLOTS],
}

/// Counters shared between the driver and partition workers.
pub type SharedCounters = Arc<PipelineCounters>;

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the shared form.
    pub fn shared() -> SharedCounters {
        Arc::new(Self::new())
    }

    pub fn increment(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.slots[counter.slot()].fetch_add(n, Ordering::Relaxed);
    }

    /// Current value. Only accurate after the contributing stage has joined.
    pub fn value(&self, counter: Counter) -> u64 {
        self.slots[counter.slot()].load(Ordering::Relaxed)
    }

    /// Copy every counter into a plain value for reporting.
    pub fn snapshot(&self) -> CounterSnapshot {
        let mut values = [0u64; COUNTER_SLOTS];
        for c in Counter::ALL {
            values[c.slot()] = self.value(c);
        }
        CounterSnapshot { values }
    }
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    values: [u64; COUNTER_SLOTS],
}

impl CounterSnapshot {
    pub fn get(&self, counter: Counter) -> u64 {
        self.values[counter.slot()]
    }

    /// (counter, value) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Counter, u64)> + '_ {
        Counter::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

//! Call sign grammar, tokenization and line scanning.

use std::sync::LazyLock;

use hamlog_core::{Counter, PipelineCounters};
use regex::Regex;

/// Optional digit, 1–2 letters, 1–4 digits, 1–3 letters, whole token only
static CALL_SIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]?[A-Za-z]{1,2}[0-9]{1,4}[A-Za-z]{1,3}$").expect("invalid call sign pattern")
});

/// Grammar check without touching any counter
pub fn is_call_sign(token: &str) -> bool {
    CALL_SIGN.is_match(token)
}

/// Classifies tokens, bumping exactly one of `ValidSigns` / `InvalidSigns`
/// per call.
#[derive(Debug, Clone, Copy)]
pub struct CallSignValidator<'a> {
    counters: &'a PipelineCounters,
}

impl<'a> CallSignValidator<'a> {
    pub fn new(counters: &'a PipelineCounters) -> Self {
        Self { counters }
    }

    pub fn validate(&self, token: &str) -> bool {
        let ok = is_call_sign(token);
        self.counters.increment(if ok {
            Counter::ValidSigns
        } else {
            Counter::InvalidSigns
        });
        ok
    }
}

/// Split a log line on single spaces.
///
/// A line without any space is its own only token (so `""` gives `[""]`).
/// Otherwise empty tokens between consecutive spaces are kept and trailing
/// empty tokens are dropped.
pub fn split_line(line: &str) -> Vec<&str> {
    if !line.contains(' ') {
        return vec![line];
    }
    let mut tokens: Vec<&str> = line.split(' ').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Per-line side effects of the read stage: watched-sign and blank-line
/// counters, then tokenization.
#[derive(Debug, Clone, Copy)]
pub struct LineScanner<'a> {
    watch_sign: &'a str,
    counters: &'a PipelineCounters,
}

impl<'a> LineScanner<'a> {
    pub fn new(watch_sign: &'a str, counters: &'a PipelineCounters) -> Self {
        Self {
            watch_sign,
            counters,
        }
    }

    pub fn scan<'l>(&self, line: &'l str) -> Vec<&'l str> {
        if !self.watch_sign.is_empty() && line.contains(self.watch_sign) {
            self.counters.increment(Counter::MatchingLines);
        }
        if line.is_empty() {
            self.counters.increment(Counter::BlankLines);
        }
        split_line(line)
    }
}

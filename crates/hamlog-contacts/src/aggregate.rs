//! Count aggregation by key, and re-keying through the call sign table.
//!
//! Counts are summed in integer hash maps, so neither input order nor the
//! way the input was partitioned changes the result.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use hamlog_core::Partitions;

use crate::table::CallSignTable;

/// `(key, count)` with `count >= 1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Aggregate {
    pub key: String,
    pub count: u64,
}

type Counts = FxHashMap<String, u64>;

fn merge(mut a: Counts, b: Counts) -> Counts {
    if a.len() < b.len() {
        return merge(b, a);
    }
    for (key, n) in b {
        *a.entry(key).or_default() += n;
    }
    a
}

/// Sorted by key so output files are stable between runs
fn into_sorted(counts: Counts) -> Vec<Aggregate> {
    let mut out: Vec<Aggregate> = counts
        .into_iter()
        .map(|(key, count)| Aggregate { key, count })
        .collect();
    out.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    out
}

fn count_keys<S: AsRef<str>>(keys: impl IntoIterator<Item = S>) -> Counts {
    let mut counts = Counts::default();
    for key in keys {
        let key = key.as_ref();
        match counts.get_mut(key) {
            Some(n) => *n += 1,
            None => {
                counts.insert(key.to_string(), 1);
            }
        }
    }
    counts
}

fn rekey_counts(aggregates: &[Aggregate], table: &CallSignTable) -> Counts {
    let mut counts = Counts::default();
    for agg in aggregates {
        let country = table.lookup(&agg.key).country();
        match counts.get_mut(country) {
            Some(n) => *n += agg.count,
            None => {
                counts.insert(country.to_string(), agg.count);
            }
        }
    }
    counts
}

/// Group equal keys and count occurrences
pub fn aggregate<S: AsRef<str>>(keys: impl IntoIterator<Item = S>) -> Vec<Aggregate> {
    into_sorted(count_keys(keys))
}

/// Map every key to its table country and re-sum colliding countries
pub fn rekey_and_reaggregate(aggregates: &[Aggregate], table: &CallSignTable) -> Vec<Aggregate> {
    into_sorted(rekey_counts(aggregates, table))
}

/// [`aggregate`] over partitions: per-partition counts, then a merge
pub fn par_aggregate<S: AsRef<str> + Sync>(parts: &Partitions<S>) -> Vec<Aggregate> {
    let counts = parts
        .parts()
        .par_iter()
        .map(|part| count_keys(part))
        .reduce(Counts::default, merge);
    into_sorted(counts)
}

/// [`rekey_and_reaggregate`] over partitions
pub fn par_rekey(parts: &Partitions<Aggregate>, table: &CallSignTable) -> Vec<Aggregate> {
    let counts = parts
        .parts()
        .par_iter()
        .map(|part| rekey_counts(part, table))
        .reduce(Counts::default, merge);
    into_sorted(counts)
}

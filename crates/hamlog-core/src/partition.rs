//! Partitioned datasets and per-partition execution.
//!
//! A [`Partitions`] is a list of disjoint shards. Work is applied one
//! partition at a time on the current rayon pool, so callers control the
//! worker count with `pool.install(..)`.

use std::hash::{Hash, Hasher};

use rayon::prelude::*;
use rustc_hash::FxHasher;

/// Disjoint shards of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitions<T> {
    parts: Vec<Vec<T>>,
}

impl<T> Partitions<T> {
    /// Wrap already-split shards
    pub fn from_parts(parts: Vec<Vec<T>>) -> Self {
        Self { parts }
    }

    /// Split into `n` contiguous chunks of near-equal size, keeping order.
    pub fn chunked(items: Vec<T>, n: usize) -> Self {
        let n = n.max(1);
        let per_part = items.len().div_ceil(n).max(1);
        let mut parts: Vec<Vec<T>> = Vec::with_capacity(n);
        let mut iter = items.into_iter().peekable();
        while iter.peek().is_some() {
            parts.push(iter.by_ref().take(per_part).collect());
        }
        parts.resize_with(n, Vec::new);
        Self { parts }
    }

    /// Hash-partition into `n` shards so equal keys land in the same shard.
    pub fn by_key<K: Hash + ?Sized>(
        items: impl IntoIterator<Item = T>,
        n: usize,
        key: impl Fn(&T) -> &K,
    ) -> Self {
        let n = n.max(1);
        let mut parts: Vec<Vec<T>> = (0..n).map(|_| Vec::new()).collect();
        for item in items {
            let mut h = FxHasher::default();
            key(&item).hash(&mut h);
            parts[(h.finish() % n as u64) as usize].push(item);
        }
        Self { parts }
    }

    /// Number of partitions (including empty ones)
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total items across partitions
    pub fn total_len(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    pub fn parts(&self) -> &[Vec<T>] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Vec<T>> {
        self.parts
    }

    /// Flatten into one vector, partition order preserved
    pub fn collect_all(self) -> Vec<T> {
        self.parts.into_iter().flatten().collect()
    }
}

impl<T: Sync> Partitions<T> {
    /// Apply `f` to every partition in parallel; results keep partition order.
    pub fn map_partitions<'a, U, F>(&'a self, f: F) -> Vec<U>
    where
        U: Send,
        F: Fn(usize, &'a [T]) -> U + Sync,
    {
        self.parts
            .par_iter()
            .enumerate()
            .map(|(idx, part)| f(idx, part))
            .collect()
    }

    /// Like [`map_partitions`](Self::map_partitions) but each partition yields a
    /// new shard, so the result stays partitioned. Items may borrow from
    /// `self`.
    pub fn flat_map_partitions<'a, U, F>(&'a self, f: F) -> Partitions<U>
    where
        U: Send,
        F: Fn(usize, &'a [T]) -> Vec<U> + Sync,
    {
        Partitions::from_parts(self.map_partitions(f))
    }
}

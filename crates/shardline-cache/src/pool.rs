//! Cache pool contracts

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// `get` calls
    pub accesses: u64,
    /// `get` calls that found a value
    pub hits: u64,
    /// Successful `put_if_absent` calls
    pub inserts: u64,
    /// `put_if_absent` calls refused because the pool was full
    pub rejected: u64,
    /// Entries currently held
    pub entries: u64,
}

impl CacheStats {
    pub fn misses(&self) -> u64 {
        self.accesses.saturating_sub(self.hits)
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.accesses == 0 {
            return 0.0;
        }
        self.hits as f64 / self.accesses as f64
    }
}

/// Flat key/value pool
///
/// `put_if_absent` is atomic per key: of several concurrent stores under one
/// key exactly one returns `true`, and its value is the one kept.
pub trait CachePool<V>: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<V>;

    /// Insert only if `key` has no value yet. Returns whether the value was stored.
    fn put_if_absent(&self, key: String, value: V) -> bool;

    fn clear(&self);

    fn stats(&self) -> CacheStats;
}

/// Two-level pool: a layer (table name) holding key → value entries
pub trait LayeredCachePool<V>: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, layer: &str, key: &str) -> Option<V>;

    /// Insert only if `key` has no value in `layer` yet.
    fn put_if_absent(&self, layer: &str, key: String, value: V) -> bool;

    fn clear(&self);

    fn stats(&self) -> CacheStats;
}

/// Shared counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    accesses: AtomicU64,
    hits: AtomicU64,
    inserts: AtomicU64,
    rejected: AtomicU64,
}

impl StatCounters {
    pub(crate) fn record_get(&self, hit: bool) {
        self.accesses.fetch_add(1, Ordering::Release);
        if hit {
            self.hits.fetch_add(1, Ordering::Release);
        }
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// `hits` is read before `accesses`, and `record_get` bumps `accesses`
    /// first, so a snapshot never shows more hits than accesses.
    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Acquire);
        CacheStats {
            accesses: self.accesses.load(Ordering::Acquire),
            hits,
            inserts: self.inserts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            entries: entries as u64,
        }
    }
}

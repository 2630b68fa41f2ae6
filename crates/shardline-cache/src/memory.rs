//! In-memory pools
//!
//! These implementations use DashMap for lock-free concurrent access. Each
//! pool holds at most `max_entries` values (per layer for the layered pool).
//! A full pool refuses new keys instead of evicting old ones.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::pool::{CachePool, CacheStats, LayeredCachePool, StatCounters};

/// Bounded map shared by both pool kinds
struct BoundedMap<V> {
    entries: DashMap<String, V>,
    len: AtomicUsize,
    max_entries: usize,
}

enum Insert {
    Stored,
    Present,
    Full,
}

impl<V: Clone> BoundedMap<V> {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            len: AtomicUsize::new(0),
            max_entries,
        }
    }

    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put_if_absent(&self, key: String, value: V) -> Insert {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Insert::Present,
            Entry::Vacant(slot) => {
                // Reserve a slot while the shard is locked so the bound is exact
                if self.len.fetch_add(1, Ordering::AcqRel) >= self.max_entries {
                    self.len.fetch_sub(1, Ordering::AcqRel);
                    return Insert::Full;
                }
                slot.insert(value);
                Insert::Stored
            }
        }
    }

    /// Every removed entry gives back its own slot, so a concurrent
    /// `put_if_absent` keeps the count exact.
    fn clear(&self) {
        self.entries.retain(|_, _| {
            self.len.fetch_sub(1, Ordering::AcqRel);
            false
        });
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }
}

/// Flat in-memory pool
pub struct MemoryCachePool<V> {
    name: String,
    map: BoundedMap<V>,
    stats: StatCounters,
}

impl<V: Clone> MemoryCachePool<V> {
    pub fn new(name: impl Into<String>, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            map: BoundedMap::new(max_entries),
            stats: StatCounters::default(),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.map.max_entries
    }
}

impl<V: Clone + Send + Sync> CachePool<V> for MemoryCachePool<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<V> {
        let value = self.map.get(key);
        self.stats.record_get(value.is_some());
        value
    }

    fn put_if_absent(&self, key: String, value: V) -> bool {
        match self.map.put_if_absent(key, value) {
            Insert::Stored => {
                self.stats.record_insert();
                true
            }
            Insert::Present => false,
            Insert::Full => {
                trace!(pool = %self.name, max_entries = self.map.max_entries, "Cache pool full");
                self.stats.record_rejected();
                false
            }
        }
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.map.len())
    }
}

/// Layered in-memory pool; every layer is bounded independently
pub struct MemoryLayeredCachePool<V> {
    name: String,
    layers: DashMap<String, Arc<BoundedMap<V>>>,
    max_entries_per_layer: usize,
    stats: StatCounters,
}

impl<V: Clone> MemoryLayeredCachePool<V> {
    pub fn new(name: impl Into<String>, max_entries_per_layer: usize) -> Self {
        Self {
            name: name.into(),
            layers: DashMap::new(),
            max_entries_per_layer,
            stats: StatCounters::default(),
        }
    }

    /// Number of layers created so far
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&self, layer: &str) -> Option<Arc<BoundedMap<V>>> {
        self.layers.get(layer).map(|l| Arc::clone(l.value()))
    }

    fn layer_or_create(&self, layer: &str) -> Arc<BoundedMap<V>> {
        if let Some(existing) = self.layer(layer) {
            return existing;
        }
        let max = self.max_entries_per_layer;
        Arc::clone(
            self.layers
                .entry(layer.to_string())
                .or_insert_with(|| Arc::new(BoundedMap::new(max)))
                .value(),
        )
    }
}

impl<V: Clone + Send + Sync> LayeredCachePool<V> for MemoryLayeredCachePool<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, layer: &str, key: &str) -> Option<V> {
        let value = self.layer(layer).and_then(|l| l.get(key));
        self.stats.record_get(value.is_some());
        value
    }

    fn put_if_absent(&self, layer: &str, key: String, value: V) -> bool {
        match self.layer_or_create(layer).put_if_absent(key, value) {
            Insert::Stored => {
                self.stats.record_insert();
                true
            }
            Insert::Present => false,
            Insert::Full => {
                trace!(pool = %self.name, layer = %layer, "Cache layer full");
                self.stats.record_rejected();
                false
            }
        }
    }

    fn clear(&self) {
        self.layers.clear();
    }

    fn stats(&self) -> CacheStats {
        let entries = self.layers.iter().map(|l| l.value().len()).sum();
        self.stats.snapshot(entries)
    }
}

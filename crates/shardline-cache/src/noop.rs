//! Pools that never hold anything
//!
//! Used when no cache service is available: every lookup misses and every
//! store is dropped, so routing still works, only slower.

use std::marker::PhantomData;

use crate::pool::{CachePool, CacheStats, LayeredCachePool, StatCounters};

pub struct NoopCachePool<V> {
    stats: StatCounters,
    _value: PhantomData<fn() -> V>,
}

impl<V> NoopCachePool<V> {
    pub fn new() -> Self {
        Self {
            stats: StatCounters::default(),
            _value: PhantomData,
        }
    }
}

impl<V> Default for NoopCachePool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CachePool<V> for NoopCachePool<V> {
    fn name(&self) -> &str {
        "noop"
    }

    fn get(&self, _key: &str) -> Option<V> {
        self.stats.record_get(false);
        None
    }

    fn put_if_absent(&self, _key: String, _value: V) -> bool {
        false
    }

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(0)
    }
}

pub struct NoopLayeredCachePool<V> {
    stats: StatCounters,
    _value: PhantomData<fn() -> V>,
}

impl<V> NoopLayeredCachePool<V> {
    pub fn new() -> Self {
        Self {
            stats: StatCounters::default(),
            _value: PhantomData,
        }
    }
}

impl<V> Default for NoopLayeredCachePool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LayeredCachePool<V> for NoopLayeredCachePool<V> {
    fn name(&self) -> &str {
        "noop"
    }

    fn get(&self, _layer: &str, _key: &str) -> Option<V> {
        self.stats.record_get(false);
        None
    }

    fn put_if_absent(&self, _layer: &str, _key: String, _value: V) -> bool {
        false
    }

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(0)
    }
}

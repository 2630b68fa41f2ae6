//! Named pool registry

use shardline_types::CacheConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::CacheError;
use crate::memory::{MemoryCachePool, MemoryLayeredCachePool};
use crate::pool::{CachePool, LayeredCachePool};

/// Statement text → routing decision
pub const STATEMENT_ROUTE_POOL: &str = "sql_route_cache";

/// (table, primary key) → data node
pub const LAYERED_POOL: &str = "table_id_to_data_node_cache";

/// Registry of cache pools, addressed by name
///
/// `V` is the value type of flat pools, `L` the value type of layered pools.
pub struct CacheService<V, L> {
    pools: HashMap<String, Arc<dyn CachePool<V>>>,
    layered_pools: HashMap<String, Arc<dyn LayeredCachePool<L>>>,
}

impl<V, L> CacheService<V, L>
where
    V: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    /// Create an empty service
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            layered_pools: HashMap::new(),
        }
    }

    /// Create a service holding the two standard in-memory pools
    pub fn from_config(config: &CacheConfig) -> Self {
        info!(
            statement_route_max_entries = config.statement_route_max_entries,
            layered_max_entries_per_layer = config.layered_max_entries_per_layer,
            "Creating cache pools"
        );

        let mut service = Self::new();
        service.register_pool(Arc::new(MemoryCachePool::new(
            STATEMENT_ROUTE_POOL,
            config.statement_route_max_entries,
        )));
        service.register_layered_pool(Arc::new(MemoryLayeredCachePool::new(
            LAYERED_POOL,
            config.layered_max_entries_per_layer,
        )));
        service
    }

    /// Register a flat pool under its own name, replacing any previous one
    pub fn register_pool(&mut self, pool: Arc<dyn CachePool<V>>) {
        self.pools.insert(pool.name().to_string(), pool);
    }

    /// Register a layered pool under its own name, replacing any previous one
    pub fn register_layered_pool(&mut self, pool: Arc<dyn LayeredCachePool<L>>) {
        self.layered_pools.insert(pool.name().to_string(), pool);
    }

    pub fn get_pool(&self, name: &str) -> Result<Arc<dyn CachePool<V>>, CacheError> {
        self.pools
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::PoolNotFound(name.to_string()))
    }

    pub fn get_layered_pool(&self, name: &str) -> Result<Arc<dyn LayeredCachePool<L>>, CacheError> {
        self.layered_pools
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::PoolNotFound(name.to_string()))
    }

    /// Names of all registered pools, flat and layered
    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pools
            .keys()
            .chain(self.layered_pools.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl<V, L> Default for CacheService<V, L>
where
    V: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

//! Shardline Cache - routing cache pools
//!
//! Two kinds of pools back the router:
//!
//! ```text
//! ┌──────────────────────────────┐   key: schema + statement
//! │   statement-route pool       │ ─────────────────────────► Arc<RouteResult>
//! │   (CachePool)                │
//! └──────────────────────────────┘
//! ┌──────────────────────────────┐   (layer = table, key = primary key)
//! │   layered row-to-node pool   │ ─────────────────────────► DataNodeId
//! │   (LayeredCachePool)         │
//! └──────────────────────────────┘
//! ```
//!
//! The router only reads and writes the statement-route pool. The layered pool
//! is handed to the resolver untouched.
//!
//! Pools are looked up by name from a [`CacheService`] once, when the router is
//! built. In-memory pools use DashMap so `get` and `put_if_absent` can be called
//! from any number of connections without a global lock.

mod error;
mod memory;
mod noop;
mod pool;
mod service;

pub use error::CacheError;
pub use memory::{MemoryCachePool, MemoryLayeredCachePool};
pub use noop::{NoopCachePool, NoopLayeredCachePool};
pub use pool::{CachePool, CacheStats, LayeredCachePool};
pub use service::{CacheService, LAYERED_POOL, STATEMENT_ROUTE_POOL};

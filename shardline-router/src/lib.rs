//! Shardline Router - statement routing with a route cache
//!
//! Entry point for deciding where a client statement runs.
//!
//! ```text
//! route(schema, kind, text)
//!     │
//!     ├── cacheable read? ── statement-route pool hit ──► cached decision
//!     │
//!     ├── /*!mycat <routing> */ <dispatch>
//!     │        └── resolve <routing>, run <dispatch> on every target
//!     │
//!     ├── otherwise resolve the trimmed text
//!     │
//!     └── cacheable read and cacheable result? ── put_if_absent
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use shardline_router::{RouteCacheService, Router};
//! use shardline_router_core::RuleResolver;
//!
//! let caches = RouteCacheService::from_config(&system.cache);
//! let router = Router::new(&caches, Arc::new(RuleResolver::new()))?;
//!
//! let result = router.route(&system, &schema, kind, sql, "utf8mb4", &ctx)?;
//! for node in result.nodes() {
//!     execute(node.target(), node.text());
//! }
//! ```

mod explain;
mod router;

pub use explain::{ExplainRow, EXPLAIN_COLUMNS};
pub use router::{RouteCacheService, Router};

// ========== Core Modules ==========
pub mod config; // System and proxy configuration
pub mod context;
pub mod node;
pub mod route; // Route results and cache keys
pub mod schema; // Logical schemas and table rules
pub mod statement;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Export from config module
pub use config::{
    CacheConfig, ConfigError, ProxyConfig, SystemConfig, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_CHARSET, DEFAULT_HINT_CLOSE, DEFAULT_HINT_OPEN,
};

pub use context::RequestContext;
pub use node::DataNodeId;

// Export from route module
pub use route::{CacheKey, RouteResult, RouteResultNode, CACHE_KEY_SEPARATOR};

// Export from schema module
pub use schema::{SchemaConfig, TableKind, TableRule};

pub use statement::StatementKind;

/// Errors raised while deciding where a statement runs.
///
/// Every variant is returned to the immediate caller; nothing in the routing
/// core retries or logs them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("Empty statement")]
    EmptyStatement,

    #[error("Unterminated routing hint: missing closing marker {0:?}")]
    UnterminatedHint(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Statement references schema {found} but session schema is {expected}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Schema {0} has no default data node")]
    NoDefaultDataNode(String),

    #[error("Data node not found: {0}")]
    DataNodeNotFound(String),

    #[error("Sharding column {column} of table {table} not provided")]
    MissingShardKey { table: String, column: String },

    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    #[error("Statement resolved to no data nodes")]
    NoTargets,

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
}

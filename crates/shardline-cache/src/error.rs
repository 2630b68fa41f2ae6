use thiserror::Error;

/// Cache service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Cache pool not found: {0}")]
    PoolNotFound(String),
}

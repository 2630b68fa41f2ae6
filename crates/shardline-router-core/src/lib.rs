//! Shardline Router Core - statement routing strategies
//!
//! Decides which data nodes a statement targets.
//!
//! # Architecture
//!
//! ```text
//! SQL text
//!     │
//!     ▼
//! ┌─────────────────────────┐
//! │      HintMarkers        │  Splits /*!mycat <routing> */ <dispatch>
//! │  (Override present?)    │
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐
//! │       Resolver          │  Decides: which data nodes, what text
//! │   (Which shards?)       │
//! └─────────────────────────┘
//! ```
//!
//! # Strategies
//!
//! - **RuleResolver**: routes by the schema's table rules (global / sharded)
//! - **ResolverTable**: picks a resolver per statement kind, built once
//! - **KeywordClassifier**: tags a statement by its leading keyword
//!
//! The router crate combines these with the statement-route cache.

// Core modules
mod classifier;
mod hint;
mod resolver;
mod scan;
mod sharding;

// Strategies
mod rule;

// Re-exports: Classification
pub use classifier::{Classifier, KeywordClassifier};

// Re-exports: Hints
pub use hint::{Hint, HintMarkers, HintTarget};

// Re-exports: Resolution
pub use resolver::{Resolver, ResolverTable};
pub use rule::RuleResolver;
pub use sharding::hash_mod_index;

//! Routing decisions
//!
//! A [`RouteResult`] is built once per decision and never mutated afterwards.
//! Cached results are shared between connections behind an `Arc`, so none of
//! the fields are public.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::DataNodeId;
use crate::statement::StatementKind;
use crate::RoutingError;

/// Separates the schema name from the statement text in a cache key.
///
/// The unit separator cannot appear in a schema identifier, so two distinct
/// (schema, statement) pairs never produce the same key.
pub const CACHE_KEY_SEPARATOR: char = '\u{1f}';

/// One target of a routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResultNode {
    target: DataNodeId,
    kind: StatementKind,
    text: String,
}

impl RouteResultNode {
    pub fn new(target: DataNodeId, kind: StatementKind, text: impl Into<String>) -> Self {
        Self {
            target,
            kind,
            text: text.into(),
        }
    }

    pub fn target(&self) -> &DataNodeId {
        &self.target
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Exact SQL executed on the target
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Which data nodes run a statement, and with what text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    nodes: Vec<RouteResultNode>,
    cacheable: bool,
}

impl RouteResult {
    /// Build a result; an empty target set is rejected.
    pub fn new(nodes: Vec<RouteResultNode>, cacheable: bool) -> Result<Self, RoutingError> {
        if nodes.is_empty() {
            return Err(RoutingError::NoTargets);
        }
        Ok(Self { nodes, cacheable })
    }

    /// Same statement text on every node
    pub fn broadcast<I>(
        targets: I,
        kind: StatementKind,
        text: &str,
        cacheable: bool,
    ) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = DataNodeId>,
    {
        let nodes = targets
            .into_iter()
            .map(|target| RouteResultNode::new(target, kind, text))
            .collect();
        Self::new(nodes, cacheable)
    }

    pub fn nodes(&self) -> &[RouteResultNode] {
        &self.nodes
    }

    pub fn cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed result; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = &DataNodeId> {
        self.nodes.iter().map(|n| &n.target)
    }

    /// Copy of this result with every node running `text` instead.
    ///
    /// Targets, kinds, order and the cacheable flag are kept.
    pub fn with_dispatch_text(&self, text: &str) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .map(|n| RouteResultNode::new(n.target.clone(), n.kind, text))
                .collect(),
            cacheable: self.cacheable,
        }
    }
}

/// Key of the statement-route cache
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(schema: &str, statement: &str) -> Self {
        let mut key = String::with_capacity(schema.len() + statement.len() + 1);
        key.push_str(schema);
        key.push(CACHE_KEY_SEPARATOR);
        key.push_str(statement);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({:?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_rejected() {
        assert_eq!(RouteResult::new(vec![], true), Err(RoutingError::NoTargets));
    }

    #[test]
    fn test_with_dispatch_text_keeps_targets() {
        let result = RouteResult::new(
            vec![
                RouteResultNode::new("dn1".into(), StatementKind::Select, "select 1 from t_0"),
                RouteResultNode::new("dn2".into(), StatementKind::Select, "select 1 from t_1"),
            ],
            true,
        )
        .unwrap();

        let rewritten = result.with_dispatch_text("select * from t");

        let targets: Vec<_> = rewritten.targets().map(|t| t.as_str()).collect();
        assert_eq!(targets, vec!["dn1", "dn2"]);
        assert!(rewritten.nodes().iter().all(|n| n.text() == "select * from t"));
        assert!(rewritten.nodes().iter().all(|n| n.kind() == StatementKind::Select));
        assert!(rewritten.cacheable());
        // The source result is untouched
        assert_eq!(result.nodes()[0].text(), "select 1 from t_0");
    }

    #[test]
    fn test_cache_key_does_not_alias() {
        let a = CacheKey::new("ab", "cselect 1");
        let b = CacheKey::new("abc", "select 1");

        assert_ne!(a, b);
    }
}

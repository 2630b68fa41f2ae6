//! Resolver contract

use shardline_cache::LayeredCachePool;
use shardline_types::{
    DataNodeId, RequestContext, RouteResult, RoutingError, SchemaConfig, StatementKind,
    SystemConfig,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Turns a statement into a routing decision.
///
/// Implementations may block (for instance when the layered cache misses and
/// has to be filled from elsewhere); the router treats the call as a plain
/// synchronous function.
pub trait Resolver: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &self,
        system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
        charset: &str,
        ctx: &RequestContext,
        layered: &dyn LayeredCachePool<DataNodeId>,
    ) -> Result<RouteResult, RoutingError>;
}

/// Resolver chosen by statement kind
///
/// The table is filled once at startup and is read-only afterwards; kinds
/// without an entry fall through to the default resolver.
pub struct ResolverTable {
    by_kind: HashMap<StatementKind, Arc<dyn Resolver>>,
    default: Arc<dyn Resolver>,
}

impl ResolverTable {
    pub fn new(default: Arc<dyn Resolver>) -> Self {
        Self {
            by_kind: HashMap::new(),
            default,
        }
    }

    pub fn with(mut self, kind: StatementKind, resolver: Arc<dyn Resolver>) -> Self {
        self.by_kind.insert(kind, resolver);
        self
    }

    pub fn get(&self, kind: StatementKind) -> &Arc<dyn Resolver> {
        self.by_kind.get(&kind).unwrap_or(&self.default)
    }
}

impl Resolver for ResolverTable {
    fn resolve(
        &self,
        system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
        charset: &str,
        ctx: &RequestContext,
        layered: &dyn LayeredCachePool<DataNodeId>,
    ) -> Result<RouteResult, RoutingError> {
        self.get(kind)
            .resolve(system, schema, kind, text, charset, ctx, layered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardline_cache::NoopLayeredCachePool;

    /// Sends everything to one fixed node
    struct Fixed(&'static str);

    impl Resolver for Fixed {
        fn resolve(
            &self,
            _system: &SystemConfig,
            _schema: &SchemaConfig,
            kind: StatementKind,
            text: &str,
            _charset: &str,
            _ctx: &RequestContext,
            _layered: &dyn LayeredCachePool<DataNodeId>,
        ) -> Result<RouteResult, RoutingError> {
            RouteResult::broadcast([DataNodeId::from(self.0)], kind, text, true)
        }
    }

    #[test]
    fn test_dispatch_by_kind() {
        let table = ResolverTable::new(Arc::new(Fixed("dn1")))
            .with(StatementKind::Ddl, Arc::new(Fixed("dn9")));
        let system = SystemConfig::default();
        let schema = SchemaConfig::new("shop");
        let ctx = RequestContext::default();
        let layered = NoopLayeredCachePool::new();

        let ddl = table
            .resolve(&system, &schema, StatementKind::Ddl, "drop table t", "utf8mb4", &ctx, &layered)
            .unwrap();
        let select = table
            .resolve(&system, &schema, StatementKind::Select, "select 1", "utf8mb4", &ctx, &layered)
            .unwrap();

        assert_eq!(ddl.nodes()[0].target().as_str(), "dn9");
        assert_eq!(select.nodes()[0].target().as_str(), "dn1");
    }
}

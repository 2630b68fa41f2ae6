//! Router orchestration and route-cache policy

use shardline_cache::{
    CacheError, CachePool, CacheService, CacheStats, LayeredCachePool, NoopCachePool,
    NoopLayeredCachePool, LAYERED_POOL, STATEMENT_ROUTE_POOL,
};
use shardline_router_core::{Classifier, Hint, HintMarkers, HintTarget, KeywordClassifier, Resolver};
use shardline_types::{
    CacheKey, DataNodeId, RequestContext, RouteResult, RoutingError, SchemaConfig,
    StatementKind, SystemConfig,
};
use std::sync::Arc;
use tracing::debug;

/// Cache service holding the router's two pools
pub type RouteCacheService = CacheService<Arc<RouteResult>, DataNodeId>;

/// Decides which data nodes run a statement, and caches the decision.
///
/// A single router is shared by every connection. It holds no lock while
/// routing; concurrent routings of the same statement race on
/// `put_if_absent`, and the first stored decision wins.
pub struct Router {
    resolver: Arc<dyn Resolver>,
    classifier: Arc<dyn Classifier>,
    route_cache: Arc<dyn CachePool<Arc<RouteResult>>>,
    layered_cache: Arc<dyn LayeredCachePool<DataNodeId>>,
}

impl Router {
    /// Create a router using the standard pools of `caches`.
    ///
    /// Both pools are looked up once, here.
    pub fn new(caches: &RouteCacheService, resolver: Arc<dyn Resolver>) -> Result<Self, RoutingError> {
        let route_cache = caches.get_pool(STATEMENT_ROUTE_POOL).map_err(cache_unavailable)?;
        let layered_cache = caches.get_layered_pool(LAYERED_POOL).map_err(cache_unavailable)?;

        Ok(Self::with_pools(resolver, route_cache, layered_cache))
    }

    /// Create a router on explicit pools
    pub fn with_pools(
        resolver: Arc<dyn Resolver>,
        route_cache: Arc<dyn CachePool<Arc<RouteResult>>>,
        layered_cache: Arc<dyn LayeredCachePool<DataNodeId>>,
    ) -> Self {
        debug!(
            route_cache = route_cache.name(),
            layered_cache = layered_cache.name(),
            "Creating router"
        );

        Self {
            resolver,
            classifier: Arc::new(KeywordClassifier),
            route_cache,
            layered_cache,
        }
    }

    /// Replace the classifier used for the routing text of hints
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Create a router whose caches always miss
    pub fn without_cache(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_pools(
            resolver,
            Arc::new(NoopCachePool::new()),
            Arc::new(NoopLayeredCachePool::new()),
        )
    }

    /// Route one statement.
    ///
    /// `kind` is the classification of `text`. Only [`StatementKind::Select`]
    /// consults and fills the statement-route cache.
    pub fn route(
        &self,
        system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
        charset: &str,
        ctx: &RequestContext,
    ) -> Result<Arc<RouteResult>, RoutingError> {
        let hint = HintMarkers::from_config(system).parse(text)?;

        // Hinted statements are keyed on their exact text
        let statement = if hint.is_some() { text } else { text.trim() };
        if statement.is_empty() {
            return Err(RoutingError::EmptyStatement);
        }

        let cache_key = kind
            .is_cacheable_read()
            .then(|| CacheKey::new(&schema.name, statement));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.route_cache.get(key.as_str()) {
                debug!(schema = %schema.name, nodes = cached.len(), "Route cache hit");
                return Ok(cached);
            }
        }

        let result = match hint {
            Some(hint) => self.route_hint(system, schema, kind, hint, charset, ctx)?,
            None => self.resolver.resolve(
                system,
                schema,
                kind,
                statement,
                charset,
                ctx,
                self.layered_cache.as_ref(),
            )?,
        };
        let result = Arc::new(result);

        match cache_key {
            Some(key) if result.cacheable() => Ok(self.store(key, result)),
            _ => Ok(result),
        }
    }

    /// Route a statement and list every (data node, SQL) pair verbatim
    pub fn explain(
        &self,
        system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
        charset: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<crate::ExplainRow>, RoutingError> {
        let result = self.route(system, schema, kind, text, charset, ctx)?;
        Ok(result.nodes().iter().map(crate::ExplainRow::from).collect())
    }

    /// Pool the resolver may use to map primary keys to data nodes
    pub fn layered_cache(&self) -> &Arc<dyn LayeredCachePool<DataNodeId>> {
        &self.layered_cache
    }

    pub fn route_cache_stats(&self) -> CacheStats {
        self.route_cache.stats()
    }

    /// Drop every cached decision, e.g. after the schemas changed
    pub fn clear_route_cache(&self) {
        let stats = self.route_cache.stats();
        debug!(
            pool = self.route_cache.name(),
            entries = stats.entries,
            hit_ratio = stats.hit_ratio(),
            "Clearing route cache"
        );
        self.route_cache.clear();
    }

    fn route_hint(
        &self,
        system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        hint: Hint<'_>,
        charset: &str,
        ctx: &RequestContext,
    ) -> Result<RouteResult, RoutingError> {
        if hint.dispatch.is_empty() {
            return Err(RoutingError::EmptyStatement);
        }

        match hint.target() {
            HintTarget::DataNodes(nodes) => {
                if let Some(unknown) = nodes.iter().find(|n| !schema.contains_data_node(n)) {
                    return Err(RoutingError::DataNodeNotFound(unknown.to_string()));
                }
                debug!(schema = %schema.name, ?nodes, "Routing by data node hint");
                RouteResult::broadcast(nodes, kind, hint.dispatch, true)
            }
            HintTarget::Statement(routing) => {
                // Targets and kinds follow the routing statement, only the text is replaced
                let routing_kind = self.classifier.classify(routing);
                debug!(
                    schema = %schema.name,
                    routing = %routing,
                    routing_kind = %routing_kind,
                    "Routing by statement hint"
                );
                let resolved = self.resolver.resolve(
                    system,
                    schema,
                    routing_kind,
                    routing,
                    charset,
                    ctx,
                    self.layered_cache.as_ref(),
                )?;
                Ok(resolved.with_dispatch_text(hint.dispatch))
            }
        }
    }

    /// Insert-if-absent; the decision already stored wins over `result`.
    fn store(&self, key: CacheKey, result: Arc<RouteResult>) -> Arc<RouteResult> {
        let key = key.into_string();
        if self.route_cache.put_if_absent(key.clone(), Arc::clone(&result)) {
            debug!(nodes = result.len(), "Route cached");
            return result;
        }

        // Lost the race, or the pool refused the entry
        self.route_cache.get(&key).unwrap_or(result)
    }
}

fn cache_unavailable(err: CacheError) -> RoutingError {
    RoutingError::CacheUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardline_types::test_utils::shop_schema;
    use shardline_types::CacheConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sends every statement to all data nodes of the schema and counts calls
    #[derive(Default)]
    struct EverywhereResolver {
        calls: AtomicUsize,
        cacheable: bool,
    }

    impl Resolver for EverywhereResolver {
        fn resolve(
            &self,
            _system: &SystemConfig,
            schema: &SchemaConfig,
            kind: StatementKind,
            text: &str,
            _charset: &str,
            _ctx: &RequestContext,
            _layered: &dyn LayeredCachePool<DataNodeId>,
        ) -> Result<RouteResult, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.is_empty() {
                return Err(RoutingError::EmptyStatement);
            }
            RouteResult::broadcast(schema.data_nodes().into_iter().cloned(), kind, text, self.cacheable)
        }
    }

    fn router(resolver: Arc<EverywhereResolver>) -> Router {
        let caches = RouteCacheService::from_config(&CacheConfig::default());
        Router::new(&caches, resolver).unwrap()
    }

    fn route(router: &Router, kind: StatementKind, sql: &str) -> Result<Arc<RouteResult>, RoutingError> {
        router.route(
            &SystemConfig::default(),
            &shop_schema(),
            kind,
            sql,
            "utf8mb4",
            &RequestContext::default(),
        )
    }

    #[test]
    fn test_missing_pool_is_cache_unavailable() {
        let caches = RouteCacheService::new();
        let result = Router::new(&caches, Arc::new(EverywhereResolver::default()));

        assert!(matches!(result, Err(RoutingError::CacheUnavailable(_))));
    }

    #[test]
    fn test_second_select_is_served_from_cache() {
        let resolver = Arc::new(EverywhereResolver { cacheable: true, ..Default::default() });
        let router = router(Arc::clone(&resolver));

        let first = route(&router, StatementKind::Select, "select * from orders").unwrap();
        let second = route(&router, StatementKind::Select, "select * from orders").unwrap();

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(router.route_cache_stats().hits, 1);
    }

    #[test]
    fn test_trimmed_text_shares_cache_entry() {
        let resolver = Arc::new(EverywhereResolver { cacheable: true, ..Default::default() });
        let router = router(Arc::clone(&resolver));

        route(&router, StatementKind::Select, "select 1").unwrap();
        let padded = route(&router, StatementKind::Select, "  select 1 \n").unwrap();

        assert_eq!(padded.nodes()[0].text(), "select 1");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_uncacheable_result_is_not_stored() {
        let resolver = Arc::new(EverywhereResolver::default());
        let router = router(Arc::clone(&resolver));

        route(&router, StatementKind::Select, "select * from regions").unwrap();
        route(&router, StatementKind::Select, "select * from regions").unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(router.route_cache_stats().inserts, 0);
    }

    #[test]
    fn test_empty_statement() {
        let router = router(Arc::new(EverywhereResolver::default()));

        assert_eq!(
            route(&router, StatementKind::Unknown, "   "),
            Err(RoutingError::EmptyStatement)
        );
    }

    #[test]
    fn test_empty_dispatch_text() {
        let router = router(Arc::new(EverywhereResolver::default()));

        assert_eq!(
            route(&router, StatementKind::Select, "/*!mycat select 1 */   "),
            Err(RoutingError::EmptyStatement)
        );
    }

    #[test]
    fn test_hint_resolves_with_routing_statement_kind() {
        let router = router(Arc::new(EverywhereResolver::default()));

        let result = route(
            &router,
            StatementKind::Other,
            "/*!mycat select * from orders */ analyze table orders",
        )
        .unwrap();

        assert!(result.nodes().iter().all(|n| n.kind() == StatementKind::Select));
        assert!(result.nodes().iter().all(|n| n.text() == "analyze table orders"));
    }

    #[test]
    fn test_datanode_hint_must_name_known_nodes() {
        let router = router(Arc::new(EverywhereResolver::default()));

        assert_eq!(
            route(&router, StatementKind::Delete, "/*!mycat:datanode=dn7*/ delete from orders"),
            Err(RoutingError::DataNodeNotFound("dn7".to_string()))
        );
    }

    #[test]
    fn test_clear_route_cache() {
        let resolver = Arc::new(EverywhereResolver { cacheable: true, ..Default::default() });
        let router = router(Arc::clone(&resolver));

        route(&router, StatementKind::Select, "select 1").unwrap();
        router.clear_route_cache();
        route(&router, StatementKind::Select, "select 1").unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_without_cache_always_resolves() {
        let resolver = Arc::new(EverywhereResolver { cacheable: true, ..Default::default() });
        let router = Router::without_cache(resolver.clone());

        route(&router, StatementKind::Select, "select 1").unwrap();
        route(&router, StatementKind::Select, "select 1").unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }
}

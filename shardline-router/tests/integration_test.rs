//! Integration tests for Router

use bytes::Bytes;
use shardline_cache::LayeredCachePool;
use shardline_netcore::{BoundedResultBuffer, BufferOverflow};
use shardline_router::{ExplainRow, RouteCacheService, Router, EXPLAIN_COLUMNS};
use shardline_router_core::{Classifier, KeywordClassifier, Resolver, RuleResolver};
use shardline_types::test_utils::shop_schema;
use shardline_types::{
    CacheConfig, DataNodeId, RequestContext, RouteResult, RoutingError, SchemaConfig,
    StatementKind, SystemConfig,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn create_router() -> Router {
    let caches = RouteCacheService::from_config(&CacheConfig::default());
    Router::new(&caches, Arc::new(RuleResolver::new())).unwrap()
}

fn route(router: &Router, sql: &str) -> Result<Arc<RouteResult>, RoutingError> {
    let kind = KeywordClassifier.classify(sql);
    router.route(
        &SystemConfig::default(),
        &shop_schema(),
        kind,
        sql,
        "utf8mb4",
        &RequestContext::new(1, "app").with_schema("shop"),
    )
}

fn targets(result: &RouteResult) -> Vec<&str> {
    result.targets().map(|t| t.as_str()).collect()
}

#[test]
fn test_repeated_select_hits_cache() {
    let router = create_router();
    let sql = "select * from orders where user_id = 42";

    let first = route(&router, sql).unwrap();
    let second = route(&router, sql).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);

    let stats = router.route_cache_stats();
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_routing_stores_once() {
    let router = Arc::new(create_router());
    let sql = "select * from orders where user_id = 7";

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let router = Arc::clone(&router);
            tokio::spawn(async move { route(&router, sql).unwrap() })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(router.route_cache_stats().inserts, 1);
    assert_eq!(router.route_cache_stats().entries, 1);
}

/// Holds every caller inside `resolve` until all of them have missed the cache
struct BarrierResolver {
    barrier: Barrier,
}

impl Resolver for BarrierResolver {
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
        self.barrier.wait();
        RouteResult::broadcast(schema.data_nodes().into_iter().cloned(), kind, text, true)
    }
}

#[test]
fn test_racing_callers_all_get_the_stored_decision() {
    const CALLERS: usize = 8;
    let caches = RouteCacheService::from_config(&CacheConfig::default());
    let resolver = Arc::new(BarrierResolver {
        barrier: Barrier::new(CALLERS),
    });
    let router = Router::new(&caches, resolver).unwrap();

    let results: Vec<Arc<RouteResult>> = thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| s.spawn(|| route(&router, "select * from regions").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Every caller missed; the losers read back the winner's entry
    let stats = router.route_cache_stats();
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.hits, CALLERS as u64 - 1);
    assert_eq!(stats.entries, 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn test_hint_broadcasts_dispatch_text() {
    let router = create_router();

    let result = route(
        &router,
        "/*!mycat select * from orders */ select count(*) from orders_archive",
    )
    .unwrap();

    assert_eq!(targets(&result), vec!["dn1", "dn2", "dn3"]);
    assert!(result
        .nodes()
        .iter()
        .all(|n| n.text() == "select count(*) from orders_archive"));
}

#[test]
fn test_hint_with_sharding_key_picks_one_node() {
    let router = create_router();

    let result = route(
        &router,
        "/*!mycat:sql=select * from users where user_id = 'u-9'*/ select * from user_stats",
    )
    .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.nodes()[0].text(), "select * from user_stats");
}

#[test]
fn test_hinted_select_is_cached_on_full_text() {
    let router = create_router();
    let sql = "/*!mycat select * from orders */ select * from orders_archive";

    let first = route(&router, sql).unwrap();
    let second = route(&router, sql).unwrap();

    assert_eq!(first, second);
    assert_eq!(router.route_cache_stats().hits, 1);
}

#[test]
fn test_hint_key_applies_to_non_select_dispatch() {
    let router = create_router();
    let routing = "select * from orders where user_id = 7";
    let owner = route(&router, routing).unwrap().nodes()[0].target().clone();

    let analyze = route(&router, &format!("/*!mycat {routing} */ analyze table orders")).unwrap();
    assert_eq!(analyze.targets().collect::<Vec<_>>(), vec![&owner]);
    assert_eq!(analyze.nodes()[0].text(), "analyze table orders");
    assert_eq!(analyze.nodes()[0].kind(), StatementKind::Select);

    let copy = route(
        &router,
        &format!("/*!mycat:sql={routing}*/ insert into orders_archive select * from orders where user_id = 7"),
    )
    .unwrap();
    assert_eq!(copy.targets().collect::<Vec<_>>(), vec![&owner]);
    assert_eq!(copy.nodes()[0].text(), "insert into orders_archive select * from orders where user_id = 7");
}

#[test]
fn test_datanode_hint_runs_once_per_node() {
    let router = create_router();

    let result = route(&router, "/*!mycat:datanode=dn1,dn1*/ delete from audit_log").unwrap();

    assert_eq!(targets(&result), vec!["dn1"]);
}

#[test]
fn test_primary_key_from_layered_cache() {
    let router = create_router();
    let sql = "delete from orders where id = 42";

    assert_eq!(route(&router, sql).unwrap().len(), 3);

    router
        .layered_cache()
        .put_if_absent("orders", "42".to_string(), DataNodeId::from("dn2"));

    assert_eq!(targets(&route(&router, sql).unwrap()), vec!["dn2"]);
}

#[test]
fn test_datanode_hint() {
    let router = create_router();

    let result = route(&router, "/*!mycat:datanode=dn2,dn3*/ delete from audit_log").unwrap();

    assert_eq!(targets(&result), vec!["dn2", "dn3"]);
    assert_eq!(result.nodes()[0].kind(), StatementKind::Delete);
}

#[test]
fn test_marker_mid_statement_is_not_a_hint() {
    let router = create_router();

    // Routed as a plain select without a sharding key
    let result = route(&router, "select /*!mycat select 1 */ * from orders").unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.nodes()[0].text(), "select /*!mycat select 1 */ * from orders");
}

#[test]
fn test_unterminated_hint() {
    let router = create_router();

    let result = route(&router, "/*!mycat select * from orders select 1");

    assert_eq!(result, Err(RoutingError::UnterminatedHint("*/".to_string())));
}

#[test]
fn test_insert_bypasses_cache() {
    let router = create_router();
    let sql = "insert into orders (id, user_id, total) values (1, 42, 9.5)";

    let first = route(&router, sql).unwrap();
    let second = route(&router, sql).unwrap();

    assert_eq!(first, second);
    let stats = router.route_cache_stats();
    assert_eq!(stats.accesses, 0);
    assert_eq!(stats.inserts, 0);
}

#[test]
fn test_routing_errors_are_not_cached() {
    let router = create_router();

    assert_eq!(
        route(&router, "select * from invoices"),
        Err(RoutingError::TableNotFound("invoices".to_string()))
    );
    assert_eq!(router.route_cache_stats().entries, 0);
}

#[test]
fn test_explain_lists_every_node() {
    let router = create_router();
    let sql = "insert into orders (id, user_id) values (1, 10), (2, 11), (3, 12)";

    let rows: Vec<ExplainRow> = router
        .explain(
            &SystemConfig::default(),
            &shop_schema(),
            StatementKind::Insert,
            sql,
            "utf8mb4",
            &RequestContext::default(),
        )
        .unwrap();

    assert_eq!(EXPLAIN_COLUMNS, ["DATA_NODE", "SQL"]);
    assert!(!rows.is_empty());
    let row_count: usize = rows.iter().map(|r| r.sql.matches('(').count() - 1).sum();
    assert_eq!(row_count, 3);
}

#[test]
fn test_fan_out_overflows_small_buffer() {
    let router = create_router();
    let result = route(&router, "select * from orders").unwrap();
    assert_eq!(result.len(), 3);

    let mut buffer = BoundedResultBuffer::new(2);
    let mut overflow = None;
    for node in result.nodes() {
        let chunk = Bytes::from(format!("{}: ok", node.target()));
        if let Err(err) = buffer.enqueue(chunk) {
            overflow = Some(err);
        }
    }

    assert_eq!(overflow, Some(BufferOverflow { capacity: 2, size: 2 }));
    assert_eq!(buffer.dequeue(), Some(Bytes::from("dn1: ok")));
    assert_eq!(buffer.dequeue(), Some(Bytes::from("dn2: ok")));
    assert_eq!(buffer.dequeue(), None);
}

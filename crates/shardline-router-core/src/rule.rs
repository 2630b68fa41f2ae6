//! Table-rule resolver
//!
//! Routes a statement with the rules of the tables it references:
//!
//! - no table → the schema's default data node
//! - global tables only → one node for reads, every node otherwise
//! - sharded table → the nodes owning the sharding values found in the
//!   statement, the node recorded in the layered cache for a primary key, or
//!   every node of the table when neither is known

use shardline_cache::LayeredCachePool;
use shardline_types::{
    DataNodeId, RequestContext, RouteResult, RouteResultNode, RoutingError, SchemaConfig,
    StatementKind, SystemConfig, TableRule,
};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

use crate::resolver::Resolver;
use crate::scan::{self, InsertShape};
use crate::sharding::hash_mod_index;

/// Resolver backed by the schema's table rules
#[derive(Debug, Default)]
pub struct RuleResolver {
    round_robin_counter: AtomicUsize,
}

impl RuleResolver {
    pub fn new() -> Self {
        Self {
            round_robin_counter: AtomicUsize::new(0),
        }
    }

    fn route_default(
        &self,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
    ) -> Result<RouteResult, RoutingError> {
        let node = schema
            .default_data_node
            .clone()
            .ok_or_else(|| RoutingError::NoDefaultDataNode(schema.name.clone()))?;

        trace!(schema = %schema.name, node = %node, "No table referenced, using default node");
        RouteResult::broadcast([node], kind, text, kind.is_cacheable_read())
    }

    fn route_global(
        &self,
        tables: &[&TableRule],
        kind: StatementKind,
        text: &str,
    ) -> Result<RouteResult, RoutingError> {
        // Nodes holding every referenced table, in the first table's order
        let nodes: Vec<DataNodeId> = tables[0]
            .data_nodes
            .iter()
            .filter(|n| tables.iter().all(|t| t.data_nodes.contains(n)))
            .cloned()
            .collect();

        if nodes.is_empty() {
            return Err(RoutingError::Unsupported(format!(
                "global tables {} share no data node",
                table_names(tables)
            )));
        }

        if kind == StatementKind::Select {
            let index = self.round_robin_counter.fetch_add(1, Ordering::Relaxed) % nodes.len();
            return RouteResult::broadcast([nodes[index].clone()], kind, text, false);
        }

        RouteResult::broadcast(nodes, kind, text, false)
    }

    fn route_sharded(
        &self,
        table: &TableRule,
        column: &str,
        kind: StatementKind,
        text: &str,
        layered: &dyn LayeredCachePool<DataNodeId>,
    ) -> Result<RouteResult, RoutingError> {
        let masked = scan::mask_literals(text);

        match kind {
            StatementKind::Insert | StatementKind::Replace => {
                route_insert(table, column, kind, text, &masked)
            }
            StatementKind::Select | StatementKind::Update | StatementKind::Delete => {
                if kind == StatementKind::Update {
                    if let Some(clause) = scan::set_clause(&masked) {
                        let assigned = scan::assigned_columns(&masked, clause);
                        if assigned.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                            return Err(RoutingError::Unsupported(format!(
                                "sharding column {column} of table {} cannot be updated",
                                table.name
                            )));
                        }
                    }
                }

                let Some(region) = scan::where_clause(&masked) else {
                    return broadcast_table(table, kind, text);
                };

                if let Some(values) = scan::column_values(text, &masked, region.clone(), column) {
                    let indices = values
                        .iter()
                        .filter_map(|v| hash_mod_index(v, table.data_nodes.len()))
                        .collect::<BTreeSet<_>>();
                    trace!(table = %table.name, ?values, ?indices, "Routing by sharding column");
                    return RouteResult::broadcast(
                        indices.into_iter().map(|i| table.data_nodes[i].clone()),
                        kind,
                        text,
                        kind.is_cacheable_read(),
                    );
                }

                if let Some(nodes) = cached_primary_key_nodes(table, column, text, &masked, region, layered) {
                    trace!(table = %table.name, ?nodes, "Routing by cached primary key");
                    return RouteResult::broadcast(nodes, kind, text, false);
                }

                broadcast_table(table, kind, text)
            }
            _ => RouteResult::broadcast(table.data_nodes.iter().cloned(), kind, text, false),
        }
    }
}

impl Resolver for RuleResolver {
    fn resolve(
        &self,
        _system: &SystemConfig,
        schema: &SchemaConfig,
        kind: StatementKind,
        text: &str,
        _charset: &str,
        _ctx: &RequestContext,
        layered: &dyn LayeredCachePool<DataNodeId>,
    ) -> Result<RouteResult, RoutingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RoutingError::EmptyStatement);
        }

        let masked = scan::mask_literals(text);
        let mut qualified = false;
        let mut tables: Vec<&TableRule> = Vec::new();

        for reference in scan::table_refs(&masked) {
            if let Some(qualifier) = &reference.qualifier {
                if !qualifier.eq_ignore_ascii_case(&schema.name) {
                    return Err(RoutingError::SchemaMismatch {
                        expected: schema.name.clone(),
                        found: qualifier.clone(),
                    });
                }
                qualified = true;
            }

            let rule = schema
                .table(&reference.name)
                .ok_or_else(|| RoutingError::TableNotFound(reference.name.clone()))?;
            if !tables.iter().any(|t| std::ptr::eq(*t, rule)) {
                tables.push(rule);
            }
        }

        // Data nodes know nothing about the logical schema name
        let text: Cow<'_, str> = if qualified {
            Cow::Owned(scan::strip_schema_qualifier(text, &masked, &schema.name))
        } else {
            Cow::Borrowed(text)
        };

        if tables.is_empty() {
            return self.route_default(schema, kind, &text);
        }

        let sharded: Vec<&TableRule> = tables.iter().copied().filter(|t| !t.is_global()).collect();
        let Some(primary) = sharded.first() else {
            return self.route_global(&tables, kind, &text);
        };
        let column = primary.shard_column().unwrap_or_default();

        for other in &tables[..] {
            let compatible = if other.is_global() {
                primary.data_nodes.iter().all(|n| other.data_nodes.contains(n))
            } else {
                other.data_nodes == primary.data_nodes
                    && other
                        .shard_column()
                        .is_some_and(|c| c.eq_ignore_ascii_case(column))
            };
            if !compatible {
                return Err(RoutingError::Unsupported(format!(
                    "cross-shard statement over {}",
                    table_names(&tables)
                )));
            }
        }

        self.route_sharded(primary, column, kind, &text, layered)
    }
}

fn table_names(tables: &[&TableRule]) -> String {
    tables
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn broadcast_table(
    table: &TableRule,
    kind: StatementKind,
    text: &str,
) -> Result<RouteResult, RoutingError> {
    RouteResult::broadcast(
        table.data_nodes.iter().cloned(),
        kind,
        text,
        kind.is_cacheable_read(),
    )
}

/// Nodes recorded in the layered cache for every primary key value in the
/// statement; `None` unless all of them are known.
fn cached_primary_key_nodes(
    table: &TableRule,
    column: &str,
    text: &str,
    masked: &str,
    region: Range<usize>,
    layered: &dyn LayeredCachePool<DataNodeId>,
) -> Option<Vec<DataNodeId>> {
    let key = table.primary_key().filter(|k| !k.eq_ignore_ascii_case(column))?;
    let values = scan::column_values(text, masked, region, key)?;
    let layer = table.name.to_ascii_lowercase();

    let mut nodes: Vec<DataNodeId> = Vec::new();
    for value in values {
        let node = layered.get(&layer, &value)?;
        if !nodes.contains(&node) {
            nodes.push(node);
        }
    }
    Some(nodes)
}

fn route_insert(
    table: &TableRule,
    column: &str,
    kind: StatementKind,
    text: &str,
    masked: &str,
) -> Result<RouteResult, RoutingError> {
    let missing = || RoutingError::MissingShardKey {
        table: table.name.clone(),
        column: column.to_string(),
    };
    let node_for = |value: &str| {
        hash_mod_index(value, table.data_nodes.len()).ok_or(RoutingError::NoTargets)
    };

    let shape = scan::insert_shape(masked)
        .ok_or_else(|| RoutingError::Unsupported(format!("unrecognized insert: {text}")))?;

    match shape {
        InsertShape::Values {
            columns,
            head_end,
            tuples,
            tail_start,
        } => {
            let position = columns
                .as_ref()
                .and_then(|cols| cols.iter().position(|c| c.eq_ignore_ascii_case(column)))
                .ok_or_else(missing)?;

            // Rows grouped by owning node, in node order
            let mut rows: BTreeMap<usize, Vec<Range<usize>>> = BTreeMap::new();
            for tuple in tuples {
                let items = scan::split_top_level(masked, tuple.clone());
                let item = items.get(position).ok_or_else(missing)?;
                let value = scan::literal_value(&text[item.clone()]).ok_or_else(|| {
                    RoutingError::Unsupported(format!(
                        "value of sharding column {column} must be a literal"
                    ))
                })?;
                rows.entry(node_for(&value)?).or_default().push(tuple);
            }

            if rows.len() == 1 {
                let index = rows.into_keys().next().ok_or(RoutingError::NoTargets)?;
                return RouteResult::broadcast(
                    [table.data_nodes[index].clone()],
                    kind,
                    text,
                    false,
                );
            }

            // Multi-row insert spanning nodes: each node gets only its rows
            let head = text[..head_end].trim_end();
            let tail = &text[tail_start..];
            let nodes = rows
                .into_iter()
                .map(|(index, tuples)| {
                    let values = tuples
                        .iter()
                        .map(|t| format!("({})", &text[t.clone()]))
                        .collect::<Vec<_>>()
                        .join(",");
                    RouteResultNode::new(
                        table.data_nodes[index].clone(),
                        kind,
                        format!("{head} {values}{tail}"),
                    )
                })
                .collect();
            RouteResult::new(nodes, false)
        }
        InsertShape::Set { clause } => {
            let values = scan::column_values(text, masked, clause, column).ok_or_else(missing)?;
            let value = values.first().ok_or_else(missing)?;
            RouteResult::broadcast(
                [table.data_nodes[node_for(value)?].clone()],
                kind,
                text,
                false,
            )
        }
        InsertShape::Select => Err(RoutingError::Unsupported(format!(
            "INSERT ... SELECT into sharded table {}",
            table.name
        ))),
    }
}

//! Explain command handler

use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use shardline_router::{RouteCacheService, Router, EXPLAIN_COLUMNS};
use shardline_router_core::{Classifier, KeywordClassifier, RuleResolver};
use shardline_types::{RequestContext, RoutingError};
use std::sync::Arc;

pub fn handle(schema_name: &str, sql: &str, json: bool, config: &Config) -> Result<()> {
    let proxy = config.load()?;
    let schema = proxy
        .schema(schema_name)
        .ok_or_else(|| RoutingError::SchemaNotFound(schema_name.to_string()))
        .with_context(|| format!("no such schema in {}", config.path().display()))?;

    let caches = RouteCacheService::from_config(&proxy.system.cache);
    let router = Router::new(&caches, Arc::new(RuleResolver::new()))?;

    let kind = KeywordClassifier.classify(sql);
    let ctx = RequestContext::new(0, "shardline-cli").with_schema(schema_name);
    let rows = router.explain(
        &proxy.system,
        schema,
        kind,
        sql,
        &proxy.system.default_charset,
        &ctx,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} {} statement routed to {} node(s):",
        "✓".green().bold(),
        kind.to_string().cyan(),
        rows.len()
    );
    println!();

    let width = rows
        .iter()
        .map(|r| r.data_node.len())
        .max()
        .unwrap_or(0)
        .max(EXPLAIN_COLUMNS[0].len());
    println!(
        "  {}  {}",
        format!("{:<width$}", EXPLAIN_COLUMNS[0]).bold(),
        EXPLAIN_COLUMNS[1].bold()
    );
    println!("  {}", "-".repeat(width + 2 + EXPLAIN_COLUMNS[1].len()));
    for row in &rows {
        println!("  {}  {}", format!("{:<width$}", row.data_node).cyan(), row.sql);
    }

    Ok(())
}

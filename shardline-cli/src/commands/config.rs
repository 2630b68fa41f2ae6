//! Config command handlers

use crate::config::Config;
use crate::ConfigAction;
use anyhow::Result;
use colored::Colorize;
use shardline_types::TableKind;

pub fn handle(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Check => {
            println!(
                "{} Checking {}",
                "→".cyan().bold(),
                config.path().display().to_string().cyan()
            );

            let proxy = match config.load() {
                Ok(proxy) => proxy,
                Err(e) => {
                    println!("{} {:#}", "✗".red().bold(), e);
                    return Err(e);
                }
            };

            let system = &proxy.system;
            println!("{} Configuration is valid", "✓".green().bold());
            println!("  Hint markers:   {} ... {}", system.hint_open.cyan(), system.hint_close.cyan());
            println!("  Charset:        {}", system.default_charset.cyan());
            println!("  Result buffer:  {} chunks", system.result_buffer_capacity);
            println!(
                "  Route cache:    {} entries, {} per primary-key layer",
                system.cache.statement_route_max_entries,
                system.cache.layered_max_entries_per_layer
            );
            println!();

            if proxy.schemas.is_empty() {
                println!("{} No schemas configured", "!".yellow().bold());
            }
            for schema in &proxy.schemas {
                let default_node = schema
                    .default_data_node
                    .as_ref()
                    .map_or_else(|| "-".dimmed().to_string(), |n| n.to_string());
                println!(
                    "  {} ({} data nodes, default {})",
                    schema.name.bold(),
                    schema.data_nodes().len(),
                    default_node
                );
                for table in &schema.tables {
                    let rule = match &table.kind {
                        TableKind::Global => "global".to_string(),
                        TableKind::Sharded { column, .. } => format!("sharded by {column}"),
                    };
                    println!(
                        "    {:<20} {:<24} {}",
                        table.name,
                        rule,
                        table.data_nodes.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(",").dimmed()
                    );
                }
            }

            Ok(())
        }

        ConfigAction::Show => {
            let proxy = config.load()?;
            print!("{}", toml::to_string_pretty(&proxy)?);
            Ok(())
        }
    }
}

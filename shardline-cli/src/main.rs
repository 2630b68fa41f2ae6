//! Shardline CLI - inspect routing decisions offline
//!
//! Loads the proxy configuration and runs the router without any data node,
//! so operators can check where a statement would go before deploying rules.

mod commands;
mod config;

use crate::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shardline", version, about = "Shardline routing toolkit")]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "SHARDLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the data nodes and SQL a statement is routed to
    Explain {
        /// Schema the statement runs in
        #[arg(long)]
        schema: String,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,

        /// Statement text
        sql: String,
    },

    /// Print the statement kind the router would use
    Classify {
        /// Statement text
        sql: String,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and print a summary
    Check,

    /// Print the configuration with defaults filled in
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new(cli.config)?;

    match cli.command {
        Command::Explain { schema, json, sql } => {
            commands::explain::handle(&schema, &sql, json, &config)
        }
        Command::Classify { sql } => commands::classify::handle(&sql),
        Command::Config { action } => commands::config::handle(action, &config),
    }
}

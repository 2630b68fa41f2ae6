//! Process-wide configuration
//!
//! Resolved once at startup and passed by reference to whatever needs it.
//! Nothing in the routing path reads environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::schema::{SchemaConfig, TableKind};

pub const DEFAULT_HINT_OPEN: &str = "/*!mycat";
pub const DEFAULT_HINT_CLOSE: &str = "*/";
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Duplicate schema: {0}")]
    DuplicateSchema(String),

    #[error("Table {schema}.{table} has no data nodes")]
    EmptyDataNodes { schema: String, table: String },
}

/// Sizing of the two routing cache pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries in the statement-route pool
    pub statement_route_max_entries: usize,

    /// Maximum entries per layer in the layered row-to-node pool
    pub layered_max_entries_per_layer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            statement_route_max_entries: 10_000,
            layered_max_entries_per_layer: 100_000,
        }
    }
}

/// System settings shared by every connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Literal opening a routing hint
    pub hint_open: String,

    /// Literal closing a routing hint
    pub hint_close: String,

    /// Charset assumed when the client did not negotiate one
    pub default_charset: String,

    /// Capacity of each connection's result buffer, in chunks
    pub result_buffer_capacity: usize,

    pub cache: CacheConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            hint_open: DEFAULT_HINT_OPEN.to_string(),
            hint_close: DEFAULT_HINT_CLOSE.to_string(),
            default_charset: DEFAULT_CHARSET.to_string(),
            result_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            cache: CacheConfig::default(),
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hint_open.is_empty() || self.hint_close.is_empty() {
            return Err(ConfigError::Invalid(
                "hint markers must not be empty".to_string(),
            ));
        }
        if self.result_buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "result_buffer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete proxy configuration: system settings plus schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

impl ProxyConfig {
    pub fn schema(&self, name: &str) -> Option<&SchemaConfig> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.system.validate()?;

        let mut seen = HashSet::new();
        for schema in &self.schemas {
            if schema.name.is_empty() {
                return Err(ConfigError::Invalid("schema name must not be empty".to_string()));
            }
            if !seen.insert(schema.name.as_str()) {
                return Err(ConfigError::DuplicateSchema(schema.name.clone()));
            }

            let mut tables = HashSet::new();
            for table in &schema.tables {
                if !tables.insert(table.name.to_ascii_lowercase()) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate table {}.{}",
                        schema.name, table.name
                    )));
                }
                if table.data_nodes.is_empty() {
                    return Err(ConfigError::EmptyDataNodes {
                        schema: schema.name.clone(),
                        table: table.name.clone(),
                    });
                }
                if let TableKind::Sharded { column, .. } = &table.kind {
                    if column.is_empty() {
                        return Err(ConfigError::Invalid(format!(
                            "table {}.{} has an empty sharding column",
                            schema.name, table.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableRule;
    use crate::DataNodeId;

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();

        assert_eq!(config.hint_open, "/*!mycat");
        assert_eq!(config.hint_close, "*/");
        assert_eq!(config.result_buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [system]
            hint_open = "/*#route"

            [[schemas]]
            name = "shop"
            default_data_node = "dn1"

            [[schemas.tables]]
            name = "orders"
            data_nodes = ["dn1", "dn2"]
            kind = { type = "sharded", column = "user_id", primary_key = "id" }
            "#,
        )
        .unwrap();

        assert_eq!(config.system.hint_open, "/*#route");
        assert_eq!(config.system.hint_close, DEFAULT_HINT_CLOSE);
        assert_eq!(config.system.cache, CacheConfig::default());

        let shop = config.schema("shop").unwrap();
        assert_eq!(shop.default_data_node, Some(DataNodeId::from("dn1")));
        assert_eq!(shop.table("orders").unwrap().primary_key(), Some("id"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_schema_rejected() {
        let config = ProxyConfig {
            system: SystemConfig::default(),
            schemas: vec![SchemaConfig::new("shop"), SchemaConfig::new("shop")],
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSchema(name)) if name == "shop"
        ));
    }

    #[test]
    fn test_empty_data_nodes_rejected() {
        let config = ProxyConfig {
            system: SystemConfig::default(),
            schemas: vec![SchemaConfig::new("shop").with_table(TableRule::global("regions", vec![]))],
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyDataNodes { .. })
        ));
    }

    #[test]
    fn test_zero_buffer_capacity_rejected() {
        let mut system = SystemConfig::default();
        system.result_buffer_capacity = 0;

        assert!(system.validate().is_err());
    }
}

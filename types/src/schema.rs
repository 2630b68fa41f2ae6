//! Logical schemas and their table rules
//!
//! A schema is what a client sees as a database. Each table in it carries a
//! rule describing which data nodes hold its rows:
//!
//! ```text
//! schema "shop"
//!   ├── users     sharded by user_id  → [dn1, dn2, dn3]
//!   ├── regions   global              → [dn1, dn2, dn3]
//!   └── (no table) default node       → dn1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::node::DataNodeId;

/// How a table's rows are placed across its data nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TableKind {
    /// Fully replicated on every node
    Global,

    /// Spread across nodes by the value of `column`
    Sharded {
        column: String,
        /// Primary key, when it differs from the sharding column. Lookups by
        /// primary key may be answered from the layered cache.
        #[serde(default)]
        primary_key: Option<String>,
    },
}

/// Placement rule of one logical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRule {
    pub name: String,
    pub data_nodes: Vec<DataNodeId>,
    pub kind: TableKind,
}

impl TableRule {
    pub fn global(name: impl Into<String>, data_nodes: Vec<DataNodeId>) -> Self {
        Self {
            name: name.into(),
            data_nodes,
            kind: TableKind::Global,
        }
    }

    pub fn sharded(
        name: impl Into<String>,
        column: impl Into<String>,
        data_nodes: Vec<DataNodeId>,
    ) -> Self {
        Self {
            name: name.into(),
            data_nodes,
            kind: TableKind::Sharded {
                column: column.into(),
                primary_key: None,
            },
        }
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        if let TableKind::Sharded { primary_key, .. } = &mut self.kind {
            *primary_key = Some(key.into());
        }
        self
    }

    pub fn is_global(&self) -> bool {
        matches!(self.kind, TableKind::Global)
    }

    /// Sharding column, if the table is sharded
    pub fn shard_column(&self) -> Option<&str> {
        match &self.kind {
            TableKind::Sharded { column, .. } => Some(column),
            TableKind::Global => None,
        }
    }

    pub fn primary_key(&self) -> Option<&str> {
        match &self.kind {
            TableKind::Sharded { primary_key, .. } => primary_key.as_deref(),
            TableKind::Global => None,
        }
    }
}

/// Logical database definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub name: String,

    /// Node receiving statements that reference no table
    #[serde(default)]
    pub default_data_node: Option<DataNodeId>,

    #[serde(default)]
    pub tables: Vec<TableRule>,
}

impl SchemaConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_data_node: None,
            tables: vec![],
        }
    }

    pub fn with_default_node(mut self, node: impl Into<DataNodeId>) -> Self {
        self.default_data_node = Some(node.into());
        self
    }

    pub fn with_table(mut self, table: TableRule) -> Self {
        self.tables.push(table);
        self
    }

    /// Look a table up by name, ignoring ASCII case
    pub fn table(&self, name: &str) -> Option<&TableRule> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Every data node the schema refers to, sorted
    pub fn data_nodes(&self) -> BTreeSet<&DataNodeId> {
        self.tables
            .iter()
            .flat_map(|t| t.data_nodes.iter())
            .chain(self.default_data_node.iter())
            .collect()
    }

    pub fn contains_data_node(&self, node: &DataNodeId) -> bool {
        self.default_data_node.as_ref() == Some(node)
            || self.tables.iter().any(|t| t.data_nodes.contains(node))
    }
}

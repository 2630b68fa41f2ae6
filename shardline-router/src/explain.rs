//! EXPLAIN output rows

use serde::Serialize;
use shardline_types::RouteResultNode;

/// Column names of an EXPLAIN result set, in order
pub const EXPLAIN_COLUMNS: [&str; 2] = ["DATA_NODE", "SQL"];

/// One (data node, SQL) pair of a routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainRow {
    pub data_node: String,
    pub sql: String,
}

impl ExplainRow {
    /// Values in [`EXPLAIN_COLUMNS`] order
    pub fn values(&self) -> [&str; 2] {
        [&self.data_node, &self.sql]
    }
}

impl From<&RouteResultNode> for ExplainRow {
    fn from(node: &RouteResultNode) -> Self {
        Self {
            data_node: node.target().to_string(),
            sql: node.text().to_string(),
        }
    }
}

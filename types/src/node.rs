use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a physical data node (a backend shard).
///
/// Data nodes are owned by the schema configuration; routing only refers to
/// them by name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataNodeId(String);

impl DataNodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DataNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataNodeId({})", self.0)
    }
}

impl From<&str> for DataNodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DataNodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

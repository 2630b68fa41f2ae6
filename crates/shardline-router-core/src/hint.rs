//! Routing hints
//!
//! A hint lets an operator choose the shards with one statement while running
//! another one:
//!
//! ```text
//! /*!mycat select * from orders where user_id = 7 */ analyze table orders
//! └─ open ─┘└──────────── routing text ────────────┘└┘└──── dispatch ─────┘
//!                                                 close
//! ```
//!
//! Only a marker at offset 0 of the untrimmed text opens a hint. The routing
//! text may also name data nodes directly with `datanode=dn1,dn2`, and may be
//! written with the `:sql=` prefix.

use shardline_types::{
    DataNodeId, RoutingError, SystemConfig, DEFAULT_HINT_CLOSE, DEFAULT_HINT_OPEN,
};

/// Opening and closing literals of a hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintMarkers<'m> {
    open: &'m str,
    close: &'m str,
}

/// A hint split into its two statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint<'a> {
    /// Decides the target nodes
    pub routing: &'a str,

    /// Runs on every target node
    pub dispatch: &'a str,
}

/// What the routing text of a hint asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintTarget<'a> {
    /// Resolve this statement to find the targets
    Statement(&'a str),

    /// Use these nodes as they are
    DataNodes(Vec<DataNodeId>),
}

impl<'m> HintMarkers<'m> {
    pub fn new(open: &'m str, close: &'m str) -> Self {
        Self { open, close }
    }

    pub fn from_config(config: &'m SystemConfig) -> Self {
        Self::new(&config.hint_open, &config.hint_close)
    }

    pub fn open(&self) -> &'m str {
        self.open
    }

    pub fn close(&self) -> &'m str {
        self.close
    }

    /// Split `text` into routing and dispatch statements.
    ///
    /// Returns `Ok(None)` when `text` does not start with the opening marker,
    /// and `UnterminatedHint` when it does but the closing marker never follows.
    pub fn parse<'a>(&self, text: &'a str) -> Result<Option<Hint<'a>>, RoutingError> {
        let Some(rest) = text.strip_prefix(self.open) else {
            return Ok(None);
        };

        let end = rest
            .find(self.close)
            .ok_or_else(|| RoutingError::UnterminatedHint(self.close.to_string()))?;

        Ok(Some(Hint {
            routing: rest[..end].trim(),
            dispatch: rest[end + self.close.len()..].trim(),
        }))
    }
}

impl Default for HintMarkers<'static> {
    fn default() -> Self {
        Self::new(DEFAULT_HINT_OPEN, DEFAULT_HINT_CLOSE)
    }
}

impl<'a> Hint<'a> {
    /// Interpret the routing text
    pub fn target(&self) -> HintTarget<'a> {
        let mut routing = self.routing;
        if let Some(stripped) = routing.strip_prefix(':') {
            routing = stripped.trim_start();
        }

        if let Some(list) = strip_prefix_ignore_case(routing, "datanode=") {
            // A node named twice still runs the statement once
            let mut nodes: Vec<DataNodeId> = Vec::new();
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !nodes.iter().any(|n| n.as_str() == name) {
                    nodes.push(DataNodeId::from(name));
                }
            }
            return HintTarget::DataNodes(nodes);
        }

        if let Some(sql) = strip_prefix_ignore_case(routing, "sql=") {
            return HintTarget::Statement(sql.trim());
        }

        HintTarget::Statement(routing)
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

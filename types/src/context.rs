use serde::{Deserialize, Serialize};

/// Per-request session facts forwarded to the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Frontend connection id
    pub connection_id: u64,

    /// Authenticated user
    pub user: String,

    /// Schema selected with USE, if any
    pub current_schema: Option<String>,

    /// Client address for diagnostics
    pub client_addr: Option<String>,
}

impl RequestContext {
    pub fn new(connection_id: u64, user: impl Into<String>) -> Self {
        Self {
            connection_id,
            user: user.into(),
            current_schema: None,
            client_addr: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.current_schema = Some(schema.into());
        self
    }
}

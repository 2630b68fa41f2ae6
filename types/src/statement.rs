//! Statement classification tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a SQL statement.
///
/// Produced by a classifier from the raw text and carried through routing so
/// the execution layer does not need to classify again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    /// CREATE / ALTER / DROP / TRUNCATE / RENAME
    Ddl,
    Set,
    Show,
    Use,
    Begin,
    Commit,
    Rollback,
    Explain,
    /// A leading keyword that is not recognized
    Other,
    /// No keyword could be found at all
    Unknown,
}

impl StatementKind {
    /// All kinds, in declaration order.
    pub const ALL: [StatementKind; 15] = [
        StatementKind::Select,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Replace,
        StatementKind::Ddl,
        StatementKind::Set,
        StatementKind::Show,
        StatementKind::Use,
        StatementKind::Begin,
        StatementKind::Commit,
        StatementKind::Rollback,
        StatementKind::Explain,
        StatementKind::Other,
        StatementKind::Unknown,
    ];

    /// Only plain reads are eligible for the statement-route cache.
    pub fn is_cacheable_read(&self) -> bool {
        matches!(self, StatementKind::Select)
    }

    /// Statements that modify rows.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::Update
                | StatementKind::Delete
                | StatementKind::Replace
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Replace => "REPLACE",
            StatementKind::Ddl => "DDL",
            StatementKind::Set => "SET",
            StatementKind::Show => "SHOW",
            StatementKind::Use => "USE",
            StatementKind::Begin => "BEGIN",
            StatementKind::Commit => "COMMIT",
            StatementKind::Rollback => "ROLLBACK",
            StatementKind::Explain => "EXPLAIN",
            StatementKind::Other => "OTHER",
            StatementKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_select_is_cacheable() {
        let cacheable: Vec<_> = StatementKind::ALL
            .iter()
            .filter(|k| k.is_cacheable_read())
            .collect();

        assert_eq!(cacheable, vec![&StatementKind::Select]);
    }

    #[test]
    fn test_write_kinds() {
        assert!(StatementKind::Insert.is_write());
        assert!(StatementKind::Replace.is_write());
        assert!(!StatementKind::Select.is_write());
        assert!(!StatementKind::Ddl.is_write());
    }
}

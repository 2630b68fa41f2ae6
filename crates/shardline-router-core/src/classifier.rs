//! Statement classification by leading keyword

use shardline_types::StatementKind;

/// Tags a statement. Never fails: text without a keyword is `Unknown`.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> StatementKind;
}

/// Classifies by the first keyword after leading whitespace and comments.
///
/// Block comments, including routing hints, are skipped, so a hinted
/// statement is classified by the statement it dispatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> StatementKind {
        let Some(keyword) = first_keyword(text) else {
            return StatementKind::Unknown;
        };

        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            "REPLACE" => StatementKind::Replace,
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "RENAME" => StatementKind::Ddl,
            "SET" => StatementKind::Set,
            "SHOW" => StatementKind::Show,
            "USE" => StatementKind::Use,
            "BEGIN" | "START" => StatementKind::Begin,
            "COMMIT" => StatementKind::Commit,
            "ROLLBACK" => StatementKind::Rollback,
            "EXPLAIN" | "DESCRIBE" | "DESC" => StatementKind::Explain,
            _ => StatementKind::Other,
        }
    }
}

/// First word of `text` that is not inside a comment
fn first_keyword(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if let Some(body) = rest.strip_prefix("/*") {
            // Unterminated block comment: nothing follows it
            let end = body.find("*/")?;
            rest = &body[end + 2..];
        } else if rest.starts_with("--") || rest.starts_with('#') {
            let end = rest.find('\n')?;
            rest = &rest[end + 1..];
        } else {
            break;
        }
    }

    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let keyword = &rest[..end];
    (!keyword.is_empty()).then_some(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        let classifier = KeywordClassifier::new();
        let cases = [
            ("select 1", StatementKind::Select),
            ("  SELECT * FROM t", StatementKind::Select),
            ("with x as (select 1) select * from x", StatementKind::Select),
            ("insert into t values (1)", StatementKind::Insert),
            ("Update t set a = 1", StatementKind::Update),
            ("delete from t", StatementKind::Delete),
            ("replace into t values (1)", StatementKind::Replace),
            ("create table t (id int)", StatementKind::Ddl),
            ("truncate t", StatementKind::Ddl),
            ("set names utf8mb4", StatementKind::Set),
            ("show tables", StatementKind::Show),
            ("use shop", StatementKind::Use),
            ("start transaction", StatementKind::Begin),
            ("commit", StatementKind::Commit),
            ("rollback", StatementKind::Rollback),
            ("explain select 1", StatementKind::Explain),
            ("call refresh()", StatementKind::Other),
        ];

        for (sql, expected) in cases {
            assert_eq!(classifier.classify(sql), expected, "{sql}");
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        let classifier = KeywordClassifier::new();

        assert_eq!(
            classifier.classify("/*!mycat select 1 */ insert into t values (1)"),
            StatementKind::Insert
        );
        assert_eq!(
            classifier.classify("-- note\n# other\nupdate t set a = 1"),
            StatementKind::Update
        );
    }

    #[test]
    fn test_unknown() {
        let classifier = KeywordClassifier::new();

        assert_eq!(classifier.classify(""), StatementKind::Unknown);
        assert_eq!(classifier.classify("   "), StatementKind::Unknown);
        assert_eq!(classifier.classify("/* open"), StatementKind::Unknown);
        assert_eq!(classifier.classify("-- only a comment"), StatementKind::Unknown);
        assert_eq!(classifier.classify("(select 1)"), StatementKind::Unknown);
    }
}

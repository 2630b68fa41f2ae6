//! Lightweight statement scanning
//!
//! Not a SQL parser. It finds the pieces table-rule routing needs: table
//! references, `column = literal` / `column IN (...)` predicates and the
//! column list and value tuples of an INSERT. Anything it cannot read with
//! confidence is reported as unknown so the caller falls back to broadcasting.
//!
//! Scanning runs on a *masked* copy of the statement where the inside of every
//! quoted literal is blanked out byte for byte. Offsets found in the masked
//! copy are valid in the original text, which is where literal values are read.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

const IDENT: &str = r"(?:`[^`]+`|[A-Za-z_][\w$]*)";

/// Phrases that contain table keywords without naming a table
static IGNORED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:on\s+duplicate\s+key\s+update|for\s+update|lock\s+in\s+share\s+mode|(?:extract|trim|substring|substr|position)\s*\([^()]*\))",
    )
    .expect("valid regex")
});

static SINGLE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:join|into|update|truncate(?:\s+table)?|table)\s+(?:if\s+(?:not\s+)?exists\s+)?({IDENT}(?:\s*\.\s*{IDENT})?)"
    ))
    .expect("valid regex")
});

static FROM_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)\bfrom\s+([^(\s].*?)\s*(?:\bwhere\b|\bgroup\b|\border\b|\blimit\b|\bhaving\b|\bnatural\b|\bleft\b|\bright\b|\binner\b|\bcross\b|\bfull\b|\bstraight_join\b|\bjoin\b|\bunion\b|\bfor\b|\block\b|\)|;|$)",
    )
    .expect("valid regex")
});

static LEADING_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*({IDENT})(?:\s*\.\s*({IDENT}))?")).expect("valid regex")
});

static WHERE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwhere\b").expect("valid regex"));

static SET_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\bset\b(.*?)(?:\bwhere\b|\border\b|\blimit\b|$)").expect("valid regex")
});

static OR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bor\b|\|\|").expect("valid regex"));

static EQ_PREDICATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)(?:^|[^\w$.`])(?:{IDENT}\s*\.\s*)?`?([A-Za-z_][\w$]*)`?\s*=\s*('[^']*'|"[^"]*"|-?\d+(?:\.\d+)?)"#
    ))
    .expect("valid regex")
});

static IN_PREDICATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|[^\w$.`])(?:{IDENT}\s*\.\s*)?`?([A-Za-z_][\w$]*)`?\s+in\s*\(([^()]*)\)"
    ))
    .expect("valid regex")
});

static INSERT_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*(?:insert|replace)(?:\s+(?:low_priority|delayed|high_priority|ignore))*\s+(?:into\s+)?{IDENT}(?:\s*\.\s*{IDENT})?\s*(?:\(([^()]*)\))?\s*\b(values|value|select|set)\b"
    ))
    .expect("valid regex")
});

/// A table named in a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableRef {
    pub qualifier: Option<String>,
    pub name: String,
}

/// Shape of an INSERT / REPLACE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertShape {
    /// `INSERT INTO t (cols) VALUES (...), (...) [suffix]`
    Values {
        columns: Option<Vec<String>>,
        /// End of the VALUES keyword
        head_end: usize,
        /// Inner range of each tuple
        tuples: Vec<Range<usize>>,
        /// Start of whatever follows the last tuple
        tail_start: usize,
    },
    /// `INSERT INTO t SET a = 1, b = 2`
    Set { clause: Range<usize> },
    /// `INSERT INTO t SELECT ...`
    Select,
}

/// Copy of `sql` with the inside of quoted literals replaced by spaces.
///
/// Quotes are kept and every byte of a masked character becomes one space,
/// so byte offsets are identical in both strings.
pub(crate) fn mask_literals(sql: &str) -> String {
    fn blank(out: &mut String, c: char) {
        out.extend(std::iter::repeat(' ').take(c.len_utf8()));
    }

    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
            Some(q) => {
                if c == '\\' {
                    blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else if c == q {
                    if chars.peek() == Some(&q) {
                        // Doubled quote stays inside the literal
                        chars.next();
                        out.push_str("  ");
                    } else {
                        quote = None;
                        out.push(c);
                    }
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }

    out
}

/// Value of a literal as written in the original text.
///
/// Quotes are removed and escapes resolved, so `'7'` and `7` read the same.
pub(crate) fn literal_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next()? {
        q @ ('\'' | '"') => {
            let inner = raw.strip_prefix(q)?.strip_suffix(q)?;
            let mut value = String::with_capacity(inner.len());
            let mut inner_chars = inner.chars().peekable();
            while let Some(c) = inner_chars.next() {
                if c == '\\' {
                    if let Some(escaped) = inner_chars.next() {
                        value.push(escaped);
                    }
                } else if c == q && inner_chars.peek() == Some(&q) {
                    inner_chars.next();
                    value.push(q);
                } else {
                    value.push(c);
                }
            }
            Some(value)
        }
        c if c == '-' || c.is_ascii_digit() => {
            let numeric = raw
                .chars()
                .enumerate()
                .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && c == '-'));
            (numeric && raw.chars().any(|c| c.is_ascii_digit())).then(|| raw.to_string())
        }
        _ => None,
    }
}

fn unquote_ident(ident: &str) -> String {
    ident.trim().trim_matches('`').to_string()
}

/// Masked text with phrases like `ON DUPLICATE KEY UPDATE` blanked out
fn without_ignored(masked: &str) -> String {
    IGNORED
        .replace_all(masked, |caps: &Captures| " ".repeat(caps[0].len()))
        .into_owned()
}

fn table_ref(reference: &str) -> Option<TableRef> {
    let caps = LEADING_REF.captures(reference)?;
    let first = unquote_ident(&caps[1]);
    Some(match caps.get(2) {
        Some(second) => TableRef {
            qualifier: Some(first),
            name: unquote_ident(second.as_str()),
        },
        None => TableRef {
            qualifier: None,
            name: first,
        },
    })
}

/// Tables referenced by a masked statement, in order of first appearance.
/// The `dual` pseudo table is skipped.
pub(crate) fn table_refs(masked: &str) -> Vec<TableRef> {
    let text = without_ignored(masked);
    let mut found: Vec<(usize, TableRef)> = Vec::new();

    for caps in SINGLE_REF.captures_iter(&text) {
        let m = caps.get(1).map(|m| (m.start(), m.as_str()));
        if let Some((start, reference)) = m {
            if let Some(table) = table_ref(reference) {
                found.push((start, table));
            }
        }
    }

    for caps in FROM_LIST.captures_iter(&text) {
        let Some(list) = caps.get(1) else { continue };
        let mut offset = list.start();
        for item in list.as_str().split(',') {
            if let Some(table) = table_ref(item) {
                found.push((offset, table));
            }
            offset += item.len() + 1;
        }
    }

    found.sort_by_key(|(start, _)| *start);

    let mut tables: Vec<TableRef> = Vec::new();
    for (_, table) in found {
        let duplicate = tables.iter().any(|t| {
            t.name.eq_ignore_ascii_case(&table.name) && t.qualifier == table.qualifier
        });
        if !duplicate && !table.name.eq_ignore_ascii_case("dual") {
            tables.push(table);
        }
    }
    tables
}

/// Range of the masked text after the first WHERE keyword
pub(crate) fn where_clause(masked: &str) -> Option<Range<usize>> {
    WHERE.find(masked).map(|m| m.end()..masked.len())
}

/// Range of an UPDATE's SET clause
pub(crate) fn set_clause(masked: &str) -> Option<Range<usize>> {
    SET_CLAUSE
        .captures(masked)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// Columns assigned in a SET clause
pub(crate) fn assigned_columns(masked: &str, clause: Range<usize>) -> Vec<String> {
    EQ_PREDICATE
        .captures_iter(&masked[clause])
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Literal values `column` is compared to inside `region`.
///
/// `None` when the column is not constrained to a literal set, or when an OR
/// makes the constraint unreliable.
pub(crate) fn column_values(
    original: &str,
    masked: &str,
    region: Range<usize>,
    column: &str,
) -> Option<Vec<String>> {
    let scope = &masked[region.clone()];
    if OR.is_match(scope) {
        return None;
    }

    let mut values = Vec::new();

    for caps in EQ_PREDICATE.captures_iter(scope) {
        if !caps[1].eq_ignore_ascii_case(column) {
            continue;
        }
        let value = caps.get(2)?;
        let raw = &original[region.start + value.start()..region.start + value.end()];
        values.push(literal_value(raw)?);
    }

    for caps in IN_PREDICATE.captures_iter(scope) {
        if !caps[1].eq_ignore_ascii_case(column) {
            continue;
        }
        let list = caps.get(2)?;
        let start = region.start + list.start();
        for item in split_top_level(masked, start..region.start + list.end()) {
            values.push(literal_value(&original[item])?);
        }
    }

    (!values.is_empty()).then_some(values)
}

/// Split `range` of the masked text on commas outside parentheses
pub(crate) fn split_top_level(masked: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let bytes = masked.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = range.start;

    for i in range.clone() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(start..range.end);
    parts
}

/// Parenthesized tuples starting at `start`; returns their inner ranges and
/// the offset right after the last one.
fn value_tuples(masked: &str, start: usize) -> Option<(Vec<Range<usize>>, usize)> {
    let bytes = masked.as_bytes();
    let mut tuples = Vec::new();
    let mut pos = start;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'(') {
            return None;
        }

        let open = pos;
        let mut depth = 0usize;
        let mut close = None;
        for (i, b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close?;
        tuples.push(open + 1..close);
        pos = close + 1;

        let mut next = pos;
        while next < bytes.len() && bytes[next].is_ascii_whitespace() {
            next += 1;
        }
        if bytes.get(next) == Some(&b',') {
            pos = next + 1;
        } else {
            return Some((tuples, pos));
        }
    }
}

/// Read the shape of an INSERT / REPLACE from its masked text
pub(crate) fn insert_shape(masked: &str) -> Option<InsertShape> {
    let caps = INSERT_HEAD.captures(masked)?;
    let keyword = caps.get(2)?;

    let columns = caps.get(1).map(|cols| {
        split_top_level(masked, cols.range())
            .into_iter()
            .map(|r| unquote_ident(&masked[r]))
            .collect()
    });

    match keyword.as_str().to_ascii_lowercase().as_str() {
        "values" | "value" => {
            let (tuples, tail_start) = value_tuples(masked, keyword.end())?;
            Some(InsertShape::Values {
                columns,
                head_end: keyword.end(),
                tuples,
                tail_start,
            })
        }
        "set" => {
            let end = IGNORED
                .find_at(masked, keyword.end())
                .map_or(masked.len(), |m| m.start());
            Some(InsertShape::Set {
                clause: keyword.end()..end,
            })
        }
        _ => Some(InsertShape::Select),
    }
}

/// Remove `schema.` qualifiers outside literals
pub(crate) fn strip_schema_qualifier(original: &str, masked: &str, schema: &str) -> String {
    let escaped = regex::escape(schema);
    let Ok(qualifier) = Regex::new(&format!(
        r"(?i)(?:`{escaped}`|\b{escaped}\b)\s*\.\s*"
    )) else {
        return original.to_string();
    };

    let mut out = String::with_capacity(original.len());
    let mut last = 0;
    for m in qualifier.find_iter(masked) {
        // A preceding dot means this is a column qualifier, not a schema
        if masked[..m.start()].ends_with('.') {
            continue;
        }
        out.push_str(&original[last..m.start()]);
        last = m.end();
    }
    out.push_str(&original[last..]);
    out
}

//! Statement splitting and classification.
//!
//! Schema files and example-data files are plain SQL scripts. This module cuts
//! them into individual statements (quote and comment aware) and recognises the
//! handful of statement kinds the seeder cares about.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    Insert,
    CreateIndex,
    AlterTable,
    DropTable,
}

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:TEMPORARY\s+|TEMP\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:[`"\[]?[^\s`"\[\](;]+[`"\]]?\s*\.\s*)*[`"\[]?[^\s`"\[\](;]+[`"\]]?)"#)
        .unwrap()
});

static INSERT_INTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*INSERT\s+(?:IGNORE\s+)?INTO\s+((?:[`"\[]?[^\s`"\[\](;]+[`"\]]?\s*\.\s*)*[`"\[]?[^\s`"\[\](;]+[`"\]]?)"#)
        .unwrap()
});

static CREATE_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bON\s+[`"\[]?([^\s`"\[\](;]+)[`"\]]?"#).unwrap());

static ALTER_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+(?:ONLY\s+)?[`"\[]?([^\s`"\[\];]+)[`"\]]?"#).unwrap()
});

static DROP_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?[`"\[]?([^\s`"\[\];]+)[`"\]]?"#)
        .unwrap()
});

/// Split a SQL script into statements.
///
/// Semicolons inside quoted strings or identifiers do not terminate a
/// statement. Comments between statements are dropped, and the returned
/// statements keep their terminating `;` stripped and surrounding whitespace
/// trimmed.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            if b == b'\\' && q != b'`' && i + 1 < bytes.len() {
                // Escaped character may be multibyte
                let end = (i + 1 + utf8_len(bytes[i + 1])).min(bytes.len());
                current.push_str(&sql[i..end]);
                i = end;
                continue;
            }
            if b == q {
                // Doubled quote stays inside the literal
                if i + 1 < bytes.len() && bytes[i + 1] == q {
                    current.push_str(&sql[i..i + 2]);
                    i += 2;
                    continue;
                }
                quote = None;
            }
            let len = utf8_len(b);
            current.push_str(&sql[i..i + len]);
            i += len;
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => {
                quote = Some(b);
                current.push(b as char);
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                current.push(' ');
            }
            b';' => {
                push_statement(&mut statements, &current);
                current.clear();
                i += 1;
            }
            _ => {
                let len = utf8_len(b);
                current.push_str(&sql[i..i + len]);
                i += len;
            }
        }
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, stmt: &str) {
    let trimmed = stmt.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

#[inline]
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Classify a statement and extract the table it targets.
///
/// The returned name is unquoted and stripped of any schema qualifier.
pub fn classify_statement(stmt: &str) -> (StatementType, String) {
    let trimmed = stmt.trim_start();
    if trimmed.len() < 6 {
        return (StatementType::Unknown, String::new());
    }

    let upper_prefix: String = trimmed
        .chars()
        .take(32)
        .collect::<String>()
        .to_ascii_uppercase();
    let words: Vec<&str> = upper_prefix.split_whitespace().collect();

    let matcher: Option<(StatementType, &Lazy<Regex>)> = match words.as_slice() {
        ["CREATE", "TABLE", ..]
        | ["CREATE", "TEMPORARY", "TABLE", ..]
        | ["CREATE", "TEMP", "TABLE", ..] => Some((StatementType::CreateTable, &CREATE_TABLE_RE)),
        ["INSERT", ..] => Some((StatementType::Insert, &INSERT_INTO_RE)),
        ["CREATE", "INDEX", ..] | ["CREATE", "UNIQUE", "INDEX", ..] => {
            Some((StatementType::CreateIndex, &CREATE_INDEX_RE))
        }
        ["ALTER", "TABLE", ..] => Some((StatementType::AlterTable, &ALTER_TABLE_RE)),
        ["DROP", "TABLE", ..] => Some((StatementType::DropTable, &DROP_TABLE_RE)),
        _ => None,
    };

    if let Some((kind, re)) = matcher {
        if let Some(m) = re.captures(trimmed).and_then(|c| c.get(1)) {
            return (kind, unqualified_name(m.as_str()));
        }
    }

    (StatementType::Unknown, String::new())
}

/// Split `schema.table` into its optional qualifier and bare name, unquoting both.
pub fn split_qualified_name(raw: &str) -> (Option<String>, String) {
    let parts: Vec<String> = raw
        .split('.')
        .map(|p| unquote_identifier(p.trim()))
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [] => (None, String::new()),
        [name] => (None, name.clone()),
        [.., schema, name] => (Some(schema.clone()), name.clone()),
    }
}

fn unqualified_name(raw: &str) -> String {
    split_qualified_name(raw).1
}

/// Strip backticks, double quotes or brackets around an identifier
pub fn unquote_identifier(ident: &str) -> String {
    ident
        .trim()
        .trim_matches('`')
        .trim_matches('"')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}

//! CREATE TABLE parsing for schema extraction.
//!
//! Parses CREATE TABLE statements to extract:
//! - Column definitions with declared types and constraint flags
//! - Table-level PRIMARY KEY / UNIQUE constraints
//! - Table-level and inline foreign key references

use super::{Column, ColumnId, ColumnRef, ForeignKeyDef, Schema, Table, TableId};
use crate::error::{Error, Result};
use crate::parser::{classify_statement, split_qualified_name, split_statements, StatementType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Regex to extract the (possibly qualified) table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+(?:TEMPORARY\s+|TEMP\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:[\[`"]?[^\[\]`"\s(.]+[\]`"]?\s*\.\s*)*[\[`"]?[^\[\]`"\s(.]+[\]`"]?)"#)
        .unwrap()
});

/// Regex for a column definition: name, declared type, remaining constraint text
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s+(?:PRECISION|VARYING))?(?:\s*\([^)]*\))?(?:\s+(?:UNSIGNED|SIGNED|ZEROFILL))*(?:\s+(?:WITH|WITHOUT)\s+TIME\s+ZONE)?)(.*)$"#)
        .unwrap()
});

/// Regex for PRIMARY KEY constraint
/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for table-level UNIQUE constraint: UNIQUE [KEY|INDEX] [name] (cols)
static UNIQUE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:CONSTRAINT\s+[\[`"]?[^\[\]`"\s]+[\]`"]?\s+)?UNIQUE\s*(?:KEY\s+|INDEX\s+)?(?:[\[`"]?\w+[\]`"]?\s*)?\(([^)]+)\)"#)
        .unwrap()
});

/// Regex for FOREIGN KEY constraint with optional constraint name
/// Supports: `name` (MySQL), "name" (PostgreSQL), [name] (MSSQL), name (unquoted)
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*\(([^)]+)\)"#,
    )
    .unwrap()
});

/// Regex for inline REFERENCES on a column, with optional column list
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bREFERENCES\s+((?:[\[`"]?\w+[\]`"]?\s*\.\s*)*[\[`"]?[^\[\]`"\s(,]+[\]`"]?)\s*(?:\(([^)]*)\))?"#)
        .unwrap()
});

/// Index declarations: `KEY idx (a)`, `UNIQUE KEY (a)`, `FULLTEXT INDEX ft (body)`
static INDEX_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:(?:UNIQUE|FULLTEXT|SPATIAL)\s+(?:KEY|INDEX)\b|(?:UNIQUE|FULLTEXT|SPATIAL|KEY|INDEX)\s*(?:[^\s(]+\s*)?(?:USING\s+\w+\s*)?\(\s*[\[`"A-Za-z_])"#)
        .unwrap()
});

static CHECK_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^CHECK\s*\(").unwrap());

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

static AUTO_INCREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bAUTO_INCREMENT\b|\bAUTOINCREMENT\b|\bIDENTITY\b|\bGENERATED\s+(?:ALWAYS|BY\s+DEFAULT)\s+AS\s+IDENTITY\b")
        .unwrap()
});

/// Quoted string literals, blanked out before keyword matching so a DEFAULT or
/// COMMENT text cannot be mistaken for a constraint
static STRING_LITERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^'\\]|\\.|'')*'").unwrap());

/// Words that cannot be a column's declared type
const CONSTRAINT_WORDS: &[&str] = &[
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "REFERENCES",
    "DEFAULT",
    "CHECK",
    "AUTO_INCREMENT",
];

/// Statement kinds that may appear in a schema file without being tables
const IGNORED_LEADING_WORDS: &[&str] = &[
    "SET", "USE", "BEGIN", "COMMIT", "START", "CREATE", "LOCK", "UNLOCK", "PRAGMA", "COMMENT",
];

/// Builder for constructing a schema from CREATE TABLE statements.
///
/// Building happens in two phases: every table is registered first, then
/// [`SchemaBuilder::build`] resolves foreign-key references against the
/// complete table set, so forward references work in any declaration order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    /// Register every CREATE TABLE found in a SQL script
    pub fn parse(mut self, definition_text: &str) -> Result<Self> {
        let mut found_table = false;

        for stmt in split_statements(definition_text) {
            let (kind, name) = classify_statement(&stmt);
            match kind {
                StatementType::CreateTable => {
                    self.add_create_table(&stmt)?;
                    found_table = true;
                }
                StatementType::CreateIndex
                | StatementType::AlterTable
                | StatementType::DropTable
                | StatementType::Insert => {
                    debug!(kind = ?kind, table = %name, "Ignoring statement in schema definition");
                }
                StatementType::Unknown => {
                    let first_word = stmt
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_ascii_uppercase();
                    if IGNORED_LEADING_WORDS.contains(&first_word.as_str()) {
                        debug!(statement = %stmt, "Ignoring statement in schema definition");
                    } else {
                        return Err(Error::SchemaParse(format!(
                            "unrecognized statement: {}",
                            truncate(&stmt, 60)
                        )));
                    }
                }
            }
        }

        if !found_table {
            return Err(Error::SchemaParse(
                "no CREATE TABLE statements found".to_string(),
            ));
        }

        Ok(self)
    }

    /// Parse a CREATE TABLE statement and add it to the schema
    pub fn add_create_table(&mut self, stmt: &str) -> Result<TableId> {
        let table = parse_create_table(stmt)?;

        if self.schema.tables.contains_key(&table.name) {
            return Err(Error::SchemaParse(format!(
                "table {} is defined more than once",
                table.name
            )));
        }

        Ok(self.schema.add_table(table))
    }

    /// Finalize the schema, resolving all FK references
    pub fn build(mut self) -> Result<Schema> {
        self.schema.resolve_references()?;
        Ok(self.schema)
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Schema {
    /// Resolve every table's FK definitions into `Column::reference`.
    ///
    /// Table-level definitions pair columns positionally; an inline
    /// `REFERENCES t` without a column list targets `t`'s primary key.
    pub fn resolve_references(&mut self) -> Result<()> {
        let mut resolved: Vec<(TableId, ColumnId, ColumnRef)> = Vec::new();

        for table in &self.table_defs {
            for fk in &table.foreign_keys {
                let target = self.get_table(&fk.referenced_table).ok_or_else(|| {
                    Error::SchemaParse(format!(
                        "table {} references unknown table {}",
                        table.name, fk.referenced_table
                    ))
                })?;

                if !fk.referenced_columns.is_empty()
                    && fk.referenced_columns.len() != fk.columns.len()
                {
                    return Err(Error::SchemaParse(format!(
                        "foreign key on {}({}) lists {} referenced columns",
                        table.name,
                        fk.columns.join(", "),
                        fk.referenced_columns.len()
                    )));
                }

                for (i, col_name) in fk.columns.iter().enumerate() {
                    let col_id = table.get_column_id(col_name).ok_or_else(|| {
                        Error::SchemaParse(format!(
                            "foreign key uses unknown column {}.{}",
                            table.name, col_name
                        ))
                    })?;

                    let target_col = match fk.referenced_columns.get(i) {
                        Some(name) => target.get_column(name),
                        None => target.primary_key_column(),
                    }
                    .ok_or_else(|| {
                        Error::SchemaParse(format!(
                            "foreign key {}.{} references unknown column in {}",
                            table.name, col_name, target.name
                        ))
                    })?;

                    resolved.push((
                        table.id,
                        col_id,
                        ColumnRef {
                            table: target.id,
                            column: target_col.ordinal,
                        },
                    ));
                }
            }
        }

        for (table_id, col_id, reference) in resolved {
            if let Some(col) = self
                .table_mut(table_id)
                .and_then(|t| t.columns.get_mut(col_id.0 as usize))
            {
                col.reference = Some(reference);
            }
        }

        Ok(())
    }
}

/// Parse one CREATE TABLE statement into an unresolved table
pub fn parse_create_table(stmt: &str) -> Result<Table> {
    let raw_name = CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::SchemaParse(format!("missing table name: {}", truncate(stmt, 60))))?;
    let (schema_name, name) = split_qualified_name(raw_name);

    let body = extract_table_body(stmt).ok_or_else(|| {
        Error::SchemaParse(format!("table {} has no column list", name))
    })?;

    let mut table = Table::new(name, TableId(0));
    table.schema_name = schema_name;
    table.definition = stmt.trim().to_string();

    parse_table_body(&body, &mut table)?;

    if table.columns.is_empty() {
        return Err(Error::SchemaParse(format!(
            "table {} has no columns",
            table.name
        )));
    }

    Ok(table)
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| split_qualified_name(m.as_str()).1)
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
pub(crate) fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Parse the body of a CREATE TABLE to extract columns and constraints
fn parse_table_body(body: &str, table: &mut Table) -> Result<()> {
    let mut inline_fks = Vec::new();

    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_table_constraint(trimmed) {
            parse_table_constraint(trimmed, table);
            continue;
        }

        let column = parse_column_def(trimmed, ColumnId(table.columns.len() as u16))?;
        if table.get_column(&column.name).is_some() {
            return Err(Error::SchemaParse(format!(
                "column {} is defined more than once in table {}",
                column.name, table.name
            )));
        }

        if let Some(fk) = parse_inline_reference(trimmed, &column.name) {
            inline_fks.push(fk);
        }
        table.add_column(column);
    }

    // Inline references resolve after table-level constraints
    table.foreign_keys.extend(inline_fks);
    Ok(())
}

/// Whether a table body part is a constraint or index rather than a column.
///
/// `KEY`, `INDEX`, `UNIQUE` and `CHECK` are also valid column names, so those
/// forms only count when a column list or condition follows.
pub(crate) fn is_table_constraint(part: &str) -> bool {
    let upper = part.trim_start().to_uppercase();
    upper.starts_with("PRIMARY KEY")
        || upper.starts_with("CONSTRAINT ")
        || upper.starts_with("FOREIGN KEY")
        || INDEX_CONSTRAINT_RE.is_match(part.trim_start())
        || CHECK_CONSTRAINT_RE.is_match(part.trim_start())
}

fn parse_table_constraint(constraint: &str, table: &mut Table) {
    if let Some(caps) = PRIMARY_KEY_RE.captures(constraint) {
        for col_name in parse_column_list(&caps[1]) {
            if let Some(col) = table.get_column_mut(&col_name) {
                col.is_primary_key = true;
            }
        }
    }

    if let Some(caps) = UNIQUE_CONSTRAINT_RE.captures(constraint) {
        // A composite UNIQUE does not make its columns individually unique
        let cols = parse_column_list(&caps[1]);
        if let [col_name] = cols.as_slice() {
            if let Some(col) = table.get_column_mut(col_name) {
                col.is_unique = true;
            }
        }
    }

    table.foreign_keys.extend(parse_foreign_keys(constraint));
}

/// Split table body by commas, respecting nested parentheses
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Split a column definition into name, declared type and the constraint text after it
pub(crate) fn split_column_def(def: &str) -> Option<(String, String, String)> {
    COLUMN_DEF_RE.captures(def).map(|caps| {
        (
            caps[1].to_string(),
            normalize_whitespace(&caps[2]),
            caps[3].to_string(),
        )
    })
}

/// Parse a column definition and its inline constraint flags
fn parse_column_def(def: &str, ordinal: ColumnId) -> Result<Column> {
    let (name, data_type, rest) = split_column_def(def).ok_or_else(|| {
        Error::SchemaParse(format!("column definition without type: {}", truncate(def, 60)))
    })?;
    let first_type_word = data_type
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    if CONSTRAINT_WORDS.contains(&first_type_word.as_str()) {
        return Err(Error::SchemaParse(format!(
            "column {} has no declared type",
            name
        )));
    }

    let specs = STRING_LITERAL_RE.replace_all(&rest, "''");

    let mut column = Column::new(name, data_type, ordinal);
    column.is_auto_increment = AUTO_INCREMENT_RE.is_match(&specs)
        || matches!(
            first_type_word.as_str(),
            "SERIAL" | "SMALLSERIAL" | "BIGSERIAL"
        );
    column.is_primary_key = INLINE_PRIMARY_KEY_RE.is_match(&specs);
    column.is_unique = INLINE_UNIQUE_RE.is_match(&specs);

    Ok(column)
}

/// Parse an inline `REFERENCES t(col)` clause on a column definition
fn parse_inline_reference(def: &str, column_name: &str) -> Option<ForeignKeyDef> {
    let specs = STRING_LITERAL_RE.replace_all(def, "''");
    let caps = INLINE_REFERENCES_RE.captures(&specs)?;
    let (_, referenced_table) = split_qualified_name(&caps[1]);
    let referenced_columns = caps
        .get(2)
        .map(|m| parse_column_list(m.as_str()))
        .unwrap_or_default();

    Some(ForeignKeyDef {
        name: None,
        columns: vec![column_name.to_string()],
        referenced_table,
        referenced_columns,
    })
}

/// Parse FOREIGN KEY constraints from a statement
fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKeyDef> {
    let mut fks = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let local_cols = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let ref_table = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let ref_cols = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if !local_cols.is_empty() && !ref_table.is_empty() && !ref_cols.is_empty() {
            fks.push(ForeignKeyDef {
                name,
                columns: local_cols,
                referenced_table: ref_table,
                referenced_columns: ref_cols,
            });
        }
    }

    fks
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

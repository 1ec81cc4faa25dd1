//! Embedded DuckDB engine.
//!
//! Schema files are usually MySQL flavoured, so table DDL is rewritten before
//! it reaches DuckDB: declared types go through [`TypeConverter`], MySQL-only
//! clauses are stripped, and auto-increment columns draw their default from a
//! per-column sequence.

use super::{Engine, QueryResult, TypeConverter};
use crate::error::{Error, Result};
use crate::schema::{
    extract_table_body, is_table_constraint, quote_identifier, split_column_def, split_table_body, Column,
    Table,
};
use crate::statement::Value;
use duckdb::types::ValueRef;
use duckdb::Connection;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Column-level clauses DuckDB either rejects or handles through sequences
static RE_COLUMN_CLAUSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(?:\bAUTO_INCREMENT\b|\bAUTOINCREMENT\b|\bGENERATED\s+(?:ALWAYS|BY\s+DEFAULT)\s+AS\s+IDENTITY(?:\s*\([^)]*\))?|\bIDENTITY(?:\s*\(\s*\d+\s*,\s*\d+\s*\))?|\bCOMMENT\s+'(?:[^'\\]|\\.|'')*'|\bCHARACTER\s+SET\s+\w+|\bCOLLATE\s+\w+|\bON\s+UPDATE\s+CURRENT_TIMESTAMP(?:\(\d*\))?)",
    )
    .unwrap()
});

/// Referential actions DuckDB does not implement
static RE_REFERENTIAL_ACTIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\bON\s+(?:DELETE|UPDATE)\s+(?:CASCADE|RESTRICT|NO\s+ACTION|SET\s+NULL|SET\s+DEFAULT)")
        .unwrap()
});

static RE_CONSTRAINT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^CONSTRAINT\s+[\[`"]?[^\[\]`"\s]+[\]`"]?\s+"#).unwrap());

static RE_UNIQUE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^UNIQUE\s+(?:KEY|INDEX)\s+(?:[\[`"]?\w+[\]`"]?\s*)?\("#).unwrap()
});

static RE_INDEX_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bUSING\s+(?:BTREE|HASH)\b|\s*\b(?:NON)?CLUSTERED\b").unwrap());

/// The main engine that wraps a DuckDB connection
pub struct DuckDbEngine {
    conn: Connection,
}

impl DuckDbEngine {
    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Get the underlying DuckDB connection (for advanced use)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Engine for DuckDbEngine {
    fn execute(&mut self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| Error::Engine(format!("{} (while executing: {})", e, sql)))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::Engine(format!("{} (while preparing: {})", e, sql)))?;

        let mut rows_result = stmt.query([])?;

        let mut rows: Vec<Vec<Value>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = rows_result.next()? {
            if column_count == 0 {
                column_count = row.as_ref().column_count();
            }

            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(read_value(row.get_ref(i)?));
            }
            rows.push(values);
        }

        // Drop the rows iterator to release the mutable borrow
        drop(rows_result);

        let columns: Vec<String> = (0..stmt.column_count())
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        Ok(QueryResult { columns, rows })
    }

    fn table_ddl(&self, table: &Table) -> Vec<String> {
        let statements = translate_table(table);
        debug!(table = %table.name, ddl = ?statements, "Translated table definition for DuckDB");
        statements
    }
}

/// Convert a DuckDB value into a row value
fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Int(n.into()),
        ValueRef::SmallInt(n) => Value::Int(n.into()),
        ValueRef::Int(n) => Value::Int(n.into()),
        ValueRef::BigInt(n) => Value::Int(n),
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(n.to_string())),
        ValueRef::UTinyInt(n) => Value::Int(n.into()),
        ValueRef::USmallInt(n) => Value::Int(n.into()),
        ValueRef::UInt(n) => Value::Int(n.into()),
        ValueRef::UBigInt(n) => i64::try_from(n)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(n.to_string())),
        ValueRef::Float(f) => Value::Double(f.into()),
        ValueRef::Double(f) => Value::Double(f),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .map(Value::Double)
                .unwrap_or(Value::Text(text))
        }
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Text(format!("<blob {} bytes>", b.len())),
        ValueRef::Timestamp(_, ts) => {
            // DuckDB timestamps are microseconds since epoch
            let secs = ts.div_euclid(1_000_000);
            let nanos = (ts.rem_euclid(1_000_000) * 1000) as u32;
            Value::Text(match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => ts.to_string(),
            })
        }
        ValueRef::Date32(days) => {
            // 719163 = days from 0001-01-01 to 1970-01-01
            Value::Text(match chrono::NaiveDate::from_num_days_from_ce_opt(719163 + days) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => days.to_string(),
            })
        }
        ValueRef::Time64(_, micros) => {
            let secs = (micros / 1_000_000) as u32;
            let nanos = ((micros % 1_000_000) * 1000) as u32;
            Value::Text(
                match chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos) {
                    Some(time) => time.format("%H:%M:%S").to_string(),
                    None => micros.to_string(),
                },
            )
        }
        other => Value::Text(format!("{:?}", other)),
    }
}

/// Rewrite a table definition into DuckDB statements
pub fn translate_table(table: &Table) -> Vec<String> {
    let mut statements = Vec::new();
    let mut parts = Vec::new();
    let mut columns = table.columns.iter();

    let body = extract_table_body(&table.definition).unwrap_or_default();
    for part in split_table_body(&body) {
        if part.is_empty() {
            continue;
        }

        if is_table_constraint(&part) {
            if let Some(constraint) = translate_constraint(&part) {
                parts.push(constraint);
            }
            continue;
        }

        let (Some(column), Some((_, data_type, rest))) = (columns.next(), split_column_def(&part)) else {
            continue;
        };

        let mut def = format!("{} {}", quote_identifier(&column.name), TypeConverter::convert(&data_type));
        if column.is_auto_increment {
            let sequence = sequence_name(table, column);
            statements.push(format!("CREATE SEQUENCE IF NOT EXISTS {} START 1", sequence));
            def.push_str(&format!(" DEFAULT nextval('{}')", sequence));
        }

        let rest = RE_COLUMN_CLAUSES.replace_all(&rest, "");
        let rest = RE_REFERENTIAL_ACTIONS.replace_all(&rest, "");
        let rest = rest.trim();
        if !rest.is_empty() {
            def.push(' ');
            def.push_str(&rest.replace('`', "\""));
        }
        parts.push(def);
    }

    statements.push(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote_identifier(&table.name),
        parts.join(",\n  ")
    ));
    statements
}

/// Rewrite a table-level constraint; index declarations are dropped
fn translate_constraint(part: &str) -> Option<String> {
    let stripped = RE_CONSTRAINT_NAME.replace(part.trim(), "");
    let upper = stripped.to_uppercase();

    if upper.starts_with("KEY ")
        || upper.starts_with("INDEX ")
        || upper.starts_with("FULLTEXT ")
        || upper.starts_with("SPATIAL ")
    {
        return None;
    }

    let constraint = RE_UNIQUE_KEY.replace(&stripped, "UNIQUE (");
    let constraint = RE_REFERENTIAL_ACTIONS.replace_all(&constraint, "");
    let constraint = RE_INDEX_METHOD.replace_all(&constraint, "");
    Some(constraint.trim().replace('`', "\""))
}

fn sequence_name(table: &Table, column: &Column) -> String {
    format!("seq_{}_{}", table.name, column.name)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn test_translate_auto_increment_to_sequence() {
        let schema = Schema::parse(
            "CREATE TABLE `department` (`id` int(11) NOT NULL AUTO_INCREMENT, `name` varchar(50) COMMENT 'display name', PRIMARY KEY (`id`), KEY `idx_name` (`name`)) ENGINE=InnoDB;",
        )
        .unwrap();
        let ddl = translate_table(&schema.tables()[0]);

        assert_eq!(ddl.len(), 2);
        assert_eq!(ddl[0], "CREATE SEQUENCE IF NOT EXISTS seq_department_id START 1");
        assert!(ddl[1].contains("\"id\" INTEGER DEFAULT nextval('seq_department_id') NOT NULL"));
        assert!(ddl[1].contains("\"name\" VARCHAR(50)"));
        assert!(ddl[1].contains("PRIMARY KEY (\"id\")"));
        assert!(!ddl[1].contains("COMMENT"));
        assert!(!ddl[1].contains("idx_name"));
        assert!(!ddl[1].contains("ENGINE"));
    }

    #[test]
    fn test_engine_round_trip() {
        let schema = Schema::parse(
            "CREATE TABLE item (id INT PRIMARY KEY AUTO_INCREMENT, price DOUBLE, label VARCHAR(10), added DATE)",
        )
        .unwrap();
        let mut engine = DuckDbEngine::open_in_memory().unwrap();
        for stmt in engine.table_ddl(&schema.tables()[0]) {
            engine.execute(&stmt).unwrap();
        }

        engine
            .execute("INSERT INTO item (price, label, added) VALUES (1.5, 'a', '2024-02-01'), (2.0, NULL, NULL)")
            .unwrap();

        assert_eq!(engine.query_count("SELECT COUNT(*) FROM item").unwrap(), 2);

        let result = engine
            .query("SELECT id, price, label, added FROM item ORDER BY id")
            .unwrap();
        assert_eq!(result.columns, vec!["id", "price", "label", "added"]);
        assert_eq!(
            result.rows[0],
            vec![
                Value::Int(1),
                Value::Double(1.5),
                Value::Text("a".to_string()),
                Value::Text("2024-02-01".to_string())
            ]
        );
        assert_eq!(result.rows[1][0], Value::Int(2));
        assert_eq!(result.rows[1][2], Value::Null);
    }

    #[test]
    fn test_table_ddl_can_run_twice() {
        let schema = Schema::parse("CREATE TABLE `order-line` (id INT PRIMARY KEY AUTO_INCREMENT, `key` VARCHAR(8))").unwrap();
        let table = &schema.tables()[0];
        let mut engine = DuckDbEngine::open_in_memory().unwrap();

        for _ in 0..2 {
            for stmt in engine.table_ddl(table) {
                engine.execute(&stmt).unwrap();
            }
        }

        assert_eq!(translate_table(table)[0], "CREATE SEQUENCE IF NOT EXISTS seq_order_line_id START 1");
        engine.execute("INSERT INTO \"order-line\" (\"key\") VALUES ('a')").unwrap();
        assert_eq!(engine.query_count(&table.count_sql()).unwrap(), 1);
    }

    #[test]
    fn test_execute_error_is_engine_error() {
        let mut engine = DuckDbEngine::open_in_memory().unwrap();
        let err = engine.execute("INSERT INTO missing VALUES (1)").unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
    }
}

//! Typed INSERT statements.
//!
//! An [`InsertStatement`] borrows its [`Table`] and owns rows of typed
//! [`Value`]s. Statements come from oracle output or example-data files
//! (parsed) or from code (direct), render back to canonical SQL, and merge into
//! a single multi-row statement when their column sets agree.

mod parse;

pub use parse::{parse_insert, InsertParser, Literal, ParsedInsert};

use crate::error::{Error, Result};
use crate::parser::{classify_statement, split_statements, StatementType};
use crate::schema::{sql_identifier, Column, ColumnId, Schema, Table};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::info;

/// A scalar column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Strings, date/time literals and hex literals
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as a SQL literal
    pub fn to_sql(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Double(d) => format!("{:?}", d),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Plain rendering, used in prompts and reports
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(d) => write!(f, "{}", d),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Int(n) => Value::Int(n),
            Literal::Double(d) => Value::Double(d),
            Literal::Bool(b) => Value::Bool(b),
            Literal::Text(s) => Value::Text(s),
        }
    }
}

/// Column → value mapping, ordered by column position
pub type Row = BTreeMap<ColumnId, Value>;

/// Coerce a literal against the declared type of its target column.
///
/// Only text literals are converted: into `Int` for integer-family columns and
/// into `Double` for float-family columns.
pub fn coerce_value(column: &Column, literal: Literal) -> Result<Value> {
    match literal {
        Literal::Text(text) if column.col_type.is_integer() => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Error::InvalidLiteral {
                column: column.name.clone(),
                value: text,
                expected: "integer",
            }),
        Literal::Text(text) if column.col_type.is_float() => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| Error::InvalidLiteral {
                column: column.name.clone(),
                value: text,
                expected: "floating point number",
            }),
        other => Ok(other.into()),
    }
}

/// An INSERT against one table with one or more rows
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement<'a> {
    table: &'a Table,
    rows: Vec<Row>,
}

impl<'a> InsertStatement<'a> {
    /// Build a statement from rows supplied directly
    pub fn new(table: &'a Table, rows: Vec<Row>) -> Self {
        Self { table, rows }
    }

    /// Parse INSERT text into typed rows for `table`.
    ///
    /// Returns `Ok(None)` for empty text or when the first statement is not an
    /// INSERT. The table named inside the text is not checked; `table` decides
    /// column lookup and coercion.
    pub fn parse(table: &'a Table, sql: &str) -> Result<Option<Self>> {
        let Some(stmt) = split_statements(sql).into_iter().next() else {
            return Ok(None);
        };
        if classify_statement(&stmt).0 != StatementType::Insert
            && !stmt.trim_start().to_ascii_uppercase().starts_with("INSERT")
        {
            return Ok(None);
        }

        let parsed = parse_insert(&stmt)?;
        Self::from_parsed(table, parsed).map(Some)
    }

    /// Map a raw parse onto the table's columns
    pub fn from_parsed(table: &'a Table, parsed: ParsedInsert) -> Result<Self> {
        let columns: Vec<&Column> = match &parsed.columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    table.get_column(name).ok_or_else(|| Error::UnknownColumn {
                        table: table.name.clone(),
                        column: name.clone(),
                    })
                })
                .collect::<Result<_>>()?,
            None => table.columns.iter().collect(),
        };

        let mut rows = Vec::with_capacity(parsed.tuples.len());
        for tuple in parsed.tuples {
            if tuple.len() != columns.len() {
                return Err(Error::ColumnCountMismatch {
                    expected: columns.len(),
                    found: tuple.len(),
                });
            }

            let mut row = Row::new();
            for (column, literal) in columns.iter().zip(tuple) {
                row.insert(column.ordinal, coerce_value(column, literal)?);
            }
            rows.push(row);
        }

        Ok(Self { table, rows })
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns a row sets, auto-increment columns excluded
    fn column_set(&self, row: &Row) -> BTreeSet<ColumnId> {
        row.keys()
            .copied()
            .filter(|id| {
                self.table
                    .column(*id)
                    .map(|c| !c.is_auto_increment)
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Render as a single INSERT statement.
    ///
    /// The column list holds every non-auto-increment column any row sets, in
    /// declaration order; a row without one of those columns renders NULL.
    pub fn generate_insert_statement(&self) -> String {
        let columns: Vec<&Column> = self
            .table
            .insertable_columns()
            .filter(|c| self.rows.iter().any(|row| row.contains_key(&c.ordinal)))
            .collect();

        if columns.is_empty() {
            let insert = format!("INSERT INTO {} DEFAULT VALUES;", sql_identifier(&self.table.name));
            return vec![insert; self.rows.len().max(1)].join("\n");
        }

        let column_list = columns
            .iter()
            .map(|c| sql_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values = columns
                    .iter()
                    .map(|c| row.get(&c.ordinal).map(Value::to_sql).unwrap_or_else(|| "NULL".to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", values)
            })
            .collect();

        let mut sql = format!("INSERT INTO {} ({}) VALUES ", sql_identifier(&self.table.name), column_list);
        if tuples.len() > 1 {
            sql.push_str("\n\t");
        }
        sql.push_str(&tuples.join(",\n\t"));
        sql.push(';');
        sql
    }

    /// Merge statements for one table into a single statement.
    ///
    /// Returns `Ok(None)` for an empty slice. Every row must set the same
    /// non-auto-increment columns as the first row of the first statement.
    pub fn merge_statements(statements: &[InsertStatement<'a>]) -> Result<Option<Self>> {
        let Some(first) = statements.first() else {
            return Ok(None);
        };
        let table = first.table;

        let expected = statements
            .iter()
            .flat_map(|s| s.rows.first())
            .next()
            .map(|row| first.column_set(row));

        let mut rows = Vec::with_capacity(statements.iter().map(|s| s.len()).sum());
        for statement in statements {
            if !std::ptr::eq(statement.table, table) && statement.table != table {
                return Err(Error::TableMismatch {
                    expected: table.name.clone(),
                    found: statement.table.name.clone(),
                });
            }

            for row in &statement.rows {
                if Some(statement.column_set(row)) != expected {
                    return Err(Error::ColumnMismatch {
                        table: table.name.clone(),
                    });
                }
                rows.push(row.clone());
            }
        }

        Ok(Some(Self { table, rows }))
    }

    /// Write consecutive integers starting at `first_value` into `column`, in row order
    pub fn set_auto_increment_values_incrementing(&mut self, column: ColumnId, first_value: i64) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.insert(column, Value::Int(first_value + i as i64));
        }
    }
}

impl fmt::Display for InsertStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_insert_statement())
    }
}

/// Parse every INSERT in a SQL script against the schema.
///
/// Statements for tables the schema does not know are skipped with a notice;
/// other statement kinds are ignored. A malformed INSERT for a known table is
/// an error.
pub fn parse_insert_statements<'a>(schema: &'a Schema, sql: &str) -> Result<Vec<InsertStatement<'a>>> {
    let mut statements = Vec::new();

    for stmt in split_statements(sql) {
        let (kind, table_name) = classify_statement(&stmt);
        if kind != StatementType::Insert {
            continue;
        }

        let Some(table) = schema.get_table(&table_name) else {
            info!(table = %table_name, "Skipping example data for unknown table");
            continue;
        };

        let parsed = parse_insert(&stmt)?;
        statements.push(InsertStatement::from_parsed(table, parsed)?);
    }

    Ok(statements)
}

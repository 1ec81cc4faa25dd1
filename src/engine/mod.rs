//! Relational engine interface.
//!
//! The filler only needs three primitives from a database: run a statement,
//! run a query, and read a scalar count. [`DuckDbEngine`] implements them on an
//! embedded DuckDB connection.

mod duckdb;
mod types;

pub use self::duckdb::DuckDbEngine;
pub use types::TypeConverter;

use crate::error::{Error, Result};
use crate::schema::Table;
use crate::statement::Value;

/// Result of a query execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data, one value per column
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First column of the first row
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// A database the seeder writes into
pub trait Engine {
    /// Execute a statement that doesn't return results (CREATE, INSERT)
    fn execute(&mut self, sql: &str) -> Result<usize>;

    /// Execute a query and return the results
    fn query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Run a query returning a single count
    fn query_count(&mut self, sql: &str) -> Result<u64> {
        let result = self.query(sql)?;
        match result.scalar() {
            Some(Value::Int(n)) if *n >= 0 => Ok(*n as u64),
            Some(Value::Double(d)) if *d >= 0.0 => Ok(*d as u64),
            Some(Value::Text(s)) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Engine(format!("non-numeric count '{}' from: {}", s, sql))),
            other => Err(Error::Engine(format!(
                "expected a count from '{}', got {:?}",
                sql, other
            ))),
        }
    }

    /// Statements that create `table` on this engine
    fn table_ddl(&self, table: &Table) -> Vec<String> {
        vec![table.definition.clone()]
    }
}

impl<E: Engine + ?Sized> Engine for &mut E {
    fn execute(&mut self, sql: &str) -> Result<usize> {
        (**self).execute(sql)
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        (**self).query(sql)
    }

    fn query_count(&mut self, sql: &str) -> Result<u64> {
        (**self).query_count(sql)
    }

    fn table_ddl(&self, table: &Table) -> Vec<String> {
        (**self).table_ddl(table)
    }
}

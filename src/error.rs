//! Error types shared by the schema, statement, engine and filler modules.
//!
//! The command layer wraps these in `anyhow` with context; library code returns
//! them directly so callers can tell soft generation failures from structural
//! errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Configuration errors
    #[error("Invalid schema definition: {0}")]
    SchemaParse(String),

    #[error("Oracle configuration error: {0}")]
    Oracle(String),

    // Statement errors
    #[error("Could not parse INSERT statement: {0}")]
    StatementParse(String),

    #[error("Column count mismatch: {expected} columns but {found} values")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid literal for column {column}: '{value}' is not a valid {expected}")]
    InvalidLiteral {
        column: String,
        value: String,
        expected: &'static str,
    },

    // Structural errors
    #[error("Cannot merge INSERT statements for different tables: {expected} and {found}")]
    TableMismatch { expected: String, found: String },

    #[error("Cannot merge INSERT statements with different columns for table {table}")]
    ColumnMismatch { table: String },

    #[error("Circular foreign key dependency between tables: {}", tables.join(", "))]
    CyclicDependency { tables: Vec<String> },

    #[error("Table not in insertion order: {0}")]
    TableNotInOrder(String),

    // Engine errors
    #[error("Engine error: {0}")]
    Engine(String),
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Engine(err.to_string())
    }
}

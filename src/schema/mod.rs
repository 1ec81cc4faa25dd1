//! Schema model for FK-aware seeding.
//!
//! This module provides:
//! - Data models for tables, columns, and resolved foreign-key references
//! - CREATE TABLE parsing for extracting schema information
//! - Dependency map construction with a deterministic fill order
//! - Cycle detection for circular FK relationships

mod ddl;
mod graph;

pub use ddl::*;
pub use graph::*;

use crate::error::Result;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

static BARE_IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Keywords that cannot appear as bare table or column names
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "BETWEEN",
    "BOTH", "BY", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CROSS",
    "DEFAULT", "DEFERRABLE", "DELETE", "DESC", "DESCRIBE", "DISTINCT", "DO", "DROP", "ELSE",
    "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT",
    "GROUP", "HAVING", "IN", "INDEX", "INITIALLY", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
    "JOIN", "KEY", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULL",
    "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER", "PIVOT", "PLACING", "PRIMARY", "QUALIFY",
    "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SET", "SHOW", "SOME", "SUMMARIZE",
    "SYMMETRIC", "TABLE", "THEN", "TO", "TRAILING", "TRUE", "UNION", "UNIQUE", "UNPIVOT",
    "UPDATE", "USER", "USING", "VALUES", "VARIADIC", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Always quote `name` with double quotes, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render `name` for generated SQL.
///
/// Plain identifiers stay bare; reserved words and names with other
/// characters are quoted.
pub fn sql_identifier(name: &str) -> Cow<'_, str> {
    let reserved = RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name));
    if !reserved && BARE_IDENTIFIER_RE.is_match(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(quote_identifier(name))
    }
}

/// Unique identifier for a table within a schema (its declaration index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a column within a table (its ordinal position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

/// SQL column type classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Integer family: TINYINT, SMALLINT, MEDIUMINT, INT, INTEGER, BIGINT, SERIAL
    Integer,
    /// Floating point family: FLOAT, DOUBLE, REAL
    Float,
    /// Exact numeric types: DECIMAL, NUMERIC
    Decimal,
    /// Text types: CHAR, VARCHAR, TEXT, etc.
    Text,
    /// Date/time types
    DateTime,
    /// Boolean type
    Bool,
    /// UUID types
    Uuid,
    /// Any other type
    Other(String),
}

impl ColumnType {
    /// Parse a SQL type string into a ColumnType
    /// Supports MySQL, PostgreSQL, and SQLite types
    pub fn from_sql_type(type_str: &str) -> Self {
        let type_lower = type_str.to_lowercase();
        let base_type = type_lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or(&type_lower)
            .trim();

        match base_type {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" | "int2"
            | "int4" | "int8" => ColumnType::Integer,
            "serial" | "smallserial" | "bigserial" => ColumnType::Integer,
            "float" | "double" | "real" | "float4" | "float8" => ColumnType::Float,
            "decimal" | "numeric" | "dec" | "money" => ColumnType::Decimal,
            "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" | "enum"
            | "set" | "character" | "nchar" | "nvarchar" | "clob" => ColumnType::Text,
            "date" | "datetime" | "timestamp" | "time" | "year" | "timestamptz" | "timetz" => {
                ColumnType::DateTime
            }
            "bool" | "boolean" | "bit" => ColumnType::Bool,
            "uuid" => ColumnType::Uuid,
            _ => ColumnType::Other(type_str.to_string()),
        }
    }

    /// Integer family columns receive integer-coerced literals
    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }

    /// Float family columns receive float-coerced literals
    pub fn is_float(&self) -> bool {
        matches!(self, ColumnType::Float)
    }
}

/// A foreign-key target: a column in some table of the same schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: TableId,
    pub column: ColumnId,
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type as written, e.g. `VARCHAR(50)`
    pub data_type: String,
    /// Classified type
    pub col_type: ColumnType,
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    pub is_auto_increment: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    /// Resolved foreign key target (set after the schema is complete)
    pub reference: Option<ColumnRef>,
}

impl Column {
    /// Create a column with no constraint flags
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal: ColumnId) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            col_type: ColumnType::from_sql_type(&data_type),
            data_type,
            ordinal,
            is_auto_increment: false,
            is_primary_key: false,
            is_unique: false,
            reference: None,
        }
    }
}

/// Table-level foreign key definition, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Constraint name (optional)
    pub name: Option<String>,
    /// Column names in this table
    pub columns: Vec<String>,
    /// Referenced table name
    pub referenced_table: String,
    /// Referenced column names, paired positionally with `columns`
    pub referenced_columns: Vec<String>,
}

/// Complete table definition
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Schema/namespace qualifier, if the definition had one
    pub schema_name: Option<String>,
    /// Table ID within the schema
    pub id: TableId,
    /// Column definitions in declaration order
    pub columns: Vec<Column>,
    /// FK definitions as written (table-level and inline), resolved into
    /// `Column::reference` by [`Schema::resolve_references`]
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// The CREATE TABLE statement exactly as it appeared in the input
    pub definition: String,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>, id: TableId) -> Self {
        Self {
            name: name.into(),
            schema_name: None,
            id,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            definition: String::new(),
        }
    }

    /// Get a column by name (exact match first, then case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
    }

    /// Get column ID by name
    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    /// Get mutable column by name
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let id = self.get_column_id(name)?;
        self.columns.get_mut(id.0 as usize)
    }

    /// Add a column at the next ordinal, returning its ID
    pub fn add_column(&mut self, mut column: Column) -> ColumnId {
        let id = ColumnId(self.columns.len() as u16);
        column.ordinal = id;
        self.columns.push(column);
        id
    }

    /// Columns the engine assigns values for
    pub fn auto_increment_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_auto_increment)
    }

    /// Columns that appear in rendered INSERT statements
    pub fn insertable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_auto_increment)
    }

    /// First primary key column, if any
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Name with schema qualifier, e.g. `shop.orders`
    pub fn qualified_name(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Comma separated list of all column names, in declaration order
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| sql_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT <cols> FROM t;`
    pub fn select_all_sql(&self) -> String {
        format!("SELECT {} FROM {};", self.column_list(), sql_identifier(&self.name))
    }

    /// Random bounded sample of rows, used as oracle context
    pub fn select_random_sql(&self, limit: usize) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY RANDOM() LIMIT {};",
            self.column_list(),
            sql_identifier(&self.name),
            limit
        )
    }

    /// `SELECT COUNT(*) FROM t`
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", sql_identifier(&self.name))
    }
}

/// Complete database schema
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Map from table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Tables indexed by TableId, in declaration order
    pub table_defs: Vec<Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            tables: AHashMap::new(),
            table_defs: Vec::new(),
        }
    }

    /// Parse CREATE TABLE definitions and resolve all foreign keys
    pub fn parse(definition_text: &str) -> Result<Self> {
        SchemaBuilder::new().parse(definition_text)?.build()
    }

    /// Get table ID by name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        if let Some(&id) = self.tables.get(name) {
            return Some(id);
        }
        self.tables
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, &id)| id)
    }

    /// Get table by ID
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.table_defs.get(id.0 as usize)
    }

    /// Get mutable table by ID
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.table_defs.get_mut(id.0 as usize)
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// All tables in declaration order (not dependency order)
    pub fn tables(&self) -> &[Table] {
        &self.table_defs
    }

    /// Add a new table, returning its ID
    pub fn add_table(&mut self, mut table: Table) -> TableId {
        let id = TableId(self.table_defs.len() as u32);
        table.id = id;
        self.tables.insert(table.name.clone(), id);
        self.table_defs.push(table);
        id
    }

    /// Look up the table and column a reference points at
    pub fn resolve(&self, reference: ColumnRef) -> Option<(&Table, &Column)> {
        let table = self.table(reference.table)?;
        let column = table.column(reference.column)?;
        Some((table, column))
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_defs.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_defs.is_empty()
    }

    /// Iterate over all tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.table_defs.iter()
    }
}

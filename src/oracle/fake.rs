//! Offline oracle generating plausible rows with the `fake` crate.
//!
//! Values are chosen from the column's type family and name. Foreign-key
//! columns pick a value from the referenced table's sample rows, and
//! auto-increment columns are left to the engine.

use super::{GenerationRequest, RowOracle};
use crate::schema::{Column, ColumnType, Table};
use crate::statement::{InsertStatement, Row, Value};
use ahash::AHashMap;
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

static VARCHAR_LEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*(\d+)\s*\)").unwrap());

/// Oracle that fabricates rows locally
pub struct FakeOracle {
    rng: StdRng,
    /// Next value for unique integer columns, keyed by `table.column`
    counters: AHashMap<String, i64>,
}

impl FakeOracle {
    /// Create an oracle; a seed makes the generated rows reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::seed_from_u64(rand::random()),
        };
        Self {
            rng,
            counters: AHashMap::new(),
        }
    }

    /// Build one row for `request.table`
    fn generate_row(&mut self, request: &GenerationRequest<'_>) -> Row {
        let table = request.table;
        let mut row = Row::new();

        for column in table.insertable_columns() {
            let value = match column.reference {
                Some(reference) => self.referenced_value(request, reference.table, reference.column),
                None => self.column_value(table, column, request.row_count),
            };
            row.insert(column.ordinal, value);
        }

        row
    }

    /// Pick a value of the referenced column from sample rows, NULL when none exist
    fn referenced_value(
        &mut self,
        request: &GenerationRequest<'_>,
        table_id: crate::schema::TableId,
        column_id: crate::schema::ColumnId,
    ) -> Value {
        let target = if table_id == request.table.id {
            Some(request.table)
        } else {
            request
                .dependency_examples
                .iter()
                .map(|(t, _)| *t)
                .find(|t| t.id == table_id)
        };

        let Some(target) = target else {
            return Value::Null;
        };
        let (Some(column), Some(examples)) = (target.column(column_id), request.dependency(target)) else {
            return Value::Null;
        };
        let Some(index) = examples
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&column.name))
        else {
            return Value::Null;
        };

        let candidates: Vec<&Value> = examples
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter(|v| !v.is_null())
            .collect();
        if candidates.is_empty() {
            return Value::Null;
        }
        candidates[self.rng.random_range(0..candidates.len())].clone()
    }

    fn next_counter(&mut self, table: &Table, column: &Column, row_count: u64) -> i64 {
        let key = format!("{}.{}", table.name, column.name);
        let next = self
            .counters
            .entry(key)
            .or_insert(row_count as i64 + 1);
        let value = (*next).max(row_count as i64 + 1);
        *next = value + 1;
        value
    }

    fn column_value(&mut self, table: &Table, column: &Column, row_count: u64) -> Value {
        let unique = column.is_primary_key || column.is_unique;

        match &column.col_type {
            ColumnType::Integer if unique => Value::Int(self.next_counter(table, column, row_count)),
            ColumnType::Integer => Value::Int(self.rng.random_range(1..1000)),
            ColumnType::Float | ColumnType::Decimal => {
                let cents: i64 = self.rng.random_range(100..100_000);
                Value::Double(cents as f64 / 100.0)
            }
            ColumnType::Bool => Value::Bool(self.rng.random_range(0..2) == 1),
            ColumnType::DateTime => Value::Text(self.date_value(&column.data_type)),
            ColumnType::Uuid => Value::Text(self.uuid()),
            ColumnType::Text | ColumnType::Other(_) => {
                let text = self.text_value(&column.name);
                let suffix = if unique {
                    format!(" {}", self.next_counter(table, column, row_count))
                } else {
                    String::new()
                };
                Value::Text(fit_declared(&text, &suffix, &column.data_type))
            }
        }
    }

    fn text_value(&mut self, column_name: &str) -> String {
        let name = column_name.to_lowercase();
        let rng = &mut self.rng;

        if name.contains("email") {
            SafeEmail().fake_with_rng(rng)
        } else if name.contains("first_name") || name == "firstname" {
            FirstName().fake_with_rng(rng)
        } else if name.contains("last_name") || name == "lastname" || name == "surname" {
            LastName().fake_with_rng(rng)
        } else if name.contains("company") {
            CompanyName().fake_with_rng(rng)
        } else if name.contains("user") {
            Username().fake_with_rng(rng)
        } else if name.contains("name") {
            Name().fake_with_rng(rng)
        } else if name.contains("phone") {
            PhoneNumber().fake_with_rng(rng)
        } else if name.contains("city") {
            CityName().fake_with_rng(rng)
        } else if name.contains("country") {
            CountryName().fake_with_rng(rng)
        } else if name.contains("zip") || name.contains("postal") {
            ZipCode().fake_with_rng(rng)
        } else if name.contains("street") || name.contains("address") {
            StreetName().fake_with_rng(rng)
        } else if name.contains("description") || name.contains("note") || name.contains("comment") {
            Sentence(4..10).fake_with_rng(rng)
        } else {
            Word().fake_with_rng(rng)
        }
    }

    fn date_value(&mut self, data_type: &str) -> String {
        let upper = data_type.to_uppercase();
        let year = self.rng.random_range(1990..2025);
        let month = self.rng.random_range(1..=12);
        let day = self.rng.random_range(1..=28);
        let hour = self.rng.random_range(0..24);
        let minute = self.rng.random_range(0..60);
        let second = self.rng.random_range(0..60);

        if upper.starts_with("TIMESTAMP") || upper.starts_with("DATETIME") {
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            )
        } else if upper.starts_with("TIME") {
            format!("{:02}:{:02}:{:02}", hour, minute, second)
        } else if upper.starts_with("YEAR") {
            format!("{:04}", year)
        } else {
            format!("{:04}-{:02}-{:02}", year, month, day)
        }
    }

    fn uuid(&mut self) -> String {
        format!(
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            self.rng.random::<u32>(),
            self.rng.random::<u16>(),
            (self.rng.random::<u16>() & 0x0FFF) | 0x4000, // Version 4
            (self.rng.random::<u16>() & 0x3FFF) | 0x8000, // Variant
            self.rng.random::<u64>() & 0xFFFFFFFFFFFF_u64
        )
    }
}

impl RowOracle for FakeOracle {
    fn generate(&mut self, request: &GenerationRequest<'_>) -> String {
        let row = self.generate_row(request);
        InsertStatement::new(request.table, vec![row]).generate_insert_statement()
    }
}

/// Fit `text` plus `suffix` into the length of a declared `VARCHAR(n)`/`CHAR(n)`,
/// shortening the text before the suffix
fn fit_declared(text: &str, suffix: &str, data_type: &str) -> String {
    let max = VARCHAR_LEN_RE
        .captures(data_type)
        .and_then(|c| c[1].parse::<usize>().ok());

    match max {
        Some(max) => {
            let keep = max.saturating_sub(suffix.chars().count());
            let fitted: String = text.chars().take(keep).chain(suffix.chars()).collect();
            fitted.chars().take(max).collect()
        }
        None => format!("{}{}", text, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::QueryResult;
    use crate::schema::Schema;
    use crate::statement::InsertStatement;

    fn schema() -> Schema {
        Schema::parse(
            "CREATE TABLE department (id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(8) UNIQUE);
             CREATE TABLE employee (id INT PRIMARY KEY AUTO_INCREMENT, email VARCHAR(100), hired DATE, department_id INT REFERENCES department(id));",
        )
        .unwrap()
    }

    #[test]
    fn test_generates_parseable_insert() {
        let schema = schema();
        let department = schema.get_table("department").unwrap();
        let mut oracle = FakeOracle::new(Some(7));

        let request = GenerationRequest {
            table: department,
            row_count: 0,
            examples: QueryResult::default(),
            dependency_examples: Vec::new(),
        };
        let sql = oracle.generate(&request);
        let stmt = InsertStatement::parse(department, &sql).unwrap().unwrap();

        assert_eq!(stmt.len(), 1);
        assert!(!sql.contains("id,"));
        match &stmt.rows()[0][&department.get_column_id("name").unwrap()] {
            Value::Text(name) => assert!(name.chars().count() <= 8),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_key_uses_dependency_examples() {
        let schema = schema();
        let department = schema.get_table("department").unwrap();
        let employee = schema.get_table("employee").unwrap();
        let mut oracle = FakeOracle::new(Some(1));

        let request = GenerationRequest {
            table: employee,
            row_count: 0,
            examples: QueryResult::default(),
            dependency_examples: vec![(
                department,
                QueryResult {
                    columns: vec!["id".to_string(), "name".to_string()],
                    rows: vec![vec![Value::Int(42), Value::Text("Ops".to_string())]],
                },
            )],
        };

        let stmt = InsertStatement::parse(employee, &oracle.generate(&request))
            .unwrap()
            .unwrap();
        let fk = employee.get_column_id("department_id").unwrap();
        assert_eq!(stmt.rows()[0][&fk], Value::Int(42));
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let schema = schema();
        let employee = schema.get_table("employee").unwrap();
        let request = GenerationRequest {
            table: employee,
            row_count: 3,
            examples: QueryResult::default(),
            dependency_examples: Vec::new(),
        };

        let a = FakeOracle::new(Some(99)).generate(&request);
        let b = FakeOracle::new(Some(99)).generate(&request);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_declared_keeps_suffix() {
        assert_eq!(fit_declared("abcdef", "", "VARCHAR(3)"), "abc");
        assert_eq!(fit_declared("abcdef", " 12", "VARCHAR(5)"), "ab 12");
        assert_eq!(fit_declared("abcdef", " 1", "TEXT"), "abcdef 1");
    }
}

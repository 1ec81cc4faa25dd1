//! Row-generation oracles.
//!
//! An oracle proposes one INSERT statement for a table, given the table
//! definition, how many rows it already has, and sample rows from the table and
//! from every table it references. Backends never fail loudly: transport or
//! format problems are logged and surface as an empty string, which the filler
//! treats as a soft failure.

mod fake;
pub mod ollama;
pub mod openai;

pub use self::fake::FakeOracle;
pub use ollama::OllamaOracle;
pub use openai::OpenAiOracle;

use crate::engine::QueryResult;
use crate::schema::Table;
use std::fmt::Write;

/// System prompt shared by the LLM backends
pub const SYSTEM_PROMPT: &str = "You are an assistant to generate realistic row of data for the given table in form of a single SQL INSERT statement including the generated single row of data.\nPlease try to generate fitting original data not too simple placeholder.";

/// Everything an oracle gets to see for one generation attempt
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Table to generate a row for
    pub table: &'a Table,
    /// Rows currently in the table
    pub row_count: u64,
    /// Sample of the table's own rows
    pub examples: QueryResult,
    /// Sample rows of each referenced table, in dependency order
    pub dependency_examples: Vec<(&'a Table, QueryResult)>,
}

impl<'a> GenerationRequest<'a> {
    /// Sample rows of `table`, if they were queried for this request
    pub fn dependency(&self, table: &Table) -> Option<&QueryResult> {
        if table.id == self.table.id {
            return Some(&self.examples);
        }
        self.dependency_examples
            .iter()
            .find(|(t, _)| t.id == table.id)
            .map(|(_, examples)| examples)
    }
}

/// Proposes INSERT statements for tables
pub trait RowOracle {
    /// Propose an INSERT statement, or return an empty string on failure
    fn generate(&mut self, request: &GenerationRequest<'_>) -> String;
}

impl<F> RowOracle for F
where
    F: FnMut(&GenerationRequest<'_>) -> String,
{
    fn generate(&mut self, request: &GenerationRequest<'_>) -> String {
        self(request)
    }
}

/// Render the user message describing one generation request
pub fn render_user_prompt(request: &GenerationRequest<'_>) -> String {
    let mut prompt = String::new();
    let _ = write!(
        prompt,
        "This is the table to generate data for:\n```\n{}\n```\nThere are already {} rows in the table.\nHere are some example values already in the table:\n{}\n",
        request.table.definition,
        request.row_count,
        render_markdown_table(&request.examples)
    );

    if !request.dependency_examples.is_empty() {
        prompt.push_str("\nThe table references these tables, here are some of their rows:\n");
        for (table, examples) in &request.dependency_examples {
            let _ = write!(
                prompt,
                "Table: {}\n{}\n",
                table.name,
                render_markdown_table(examples)
            );
        }
    }

    prompt
}

/// Render query rows as a markdown table
pub fn render_markdown_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(no rows)\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "| {} |", result.columns.join(" | "));
    let _ = writeln!(
        out,
        "| {} |",
        vec!["---"; result.columns.len()].join(" | ")
    );
    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.to_string().replace('|', "\\|").replace('\n', " "))
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::statement::Value;

    #[test]
    fn test_markdown_table() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![vec![Value::Int(1), Value::Text("a|b".to_string())]],
        };
        assert_eq!(
            render_markdown_table(&result),
            "| id | name |\n| --- | --- |\n| 1 | a\\|b |\n"
        );
    }

    #[test]
    fn test_user_prompt_mentions_dependencies() {
        let schema = Schema::parse(
            "CREATE TABLE department (id INT PRIMARY KEY, name VARCHAR(50));
             CREATE TABLE employee (id INT PRIMARY KEY, department_id INT REFERENCES department(id));",
        )
        .unwrap();
        let department = schema.get_table("department").unwrap();
        let employee = schema.get_table("employee").unwrap();

        let request = GenerationRequest {
            table: employee,
            row_count: 3,
            examples: QueryResult::default(),
            dependency_examples: vec![(
                department,
                QueryResult {
                    columns: vec!["id".to_string(), "name".to_string()],
                    rows: vec![vec![Value::Int(7), Value::Text("Sales".to_string())]],
                },
            )],
        };

        let prompt = render_user_prompt(&request);
        assert!(prompt.contains("There are already 3 rows in the table."));
        assert!(prompt.contains(&employee.definition));
        assert!(prompt.contains("Table: department\n| id | name |"));
        assert!(prompt.contains("| 7 | Sales |"));
        assert_eq!(request.dependency(department).unwrap().row_count(), 1);
    }
}

//! Output of generated data as SQL scripts.
//!
//! Each table with at least one statement becomes a banner followed by one
//! merged INSERT. When the statements cannot be merged (their rows set
//! different columns) they are written one by one instead.

use crate::filler::GeneratedData;
use crate::schema::Table;
use crate::statement::InsertStatement;
use ahash::AHashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
pub const STMT_BUFFER_COUNT: usize = 100;

const BANNER_RULE: &str = "-- ==========================";

/// Render the data block for one table: banner, statements, blank line.
///
/// Returns an empty string when there are no statements.
pub fn render_table_data(table: &Table, statements: &[InsertStatement<'_>]) -> String {
    if statements.is_empty() {
        return String::new();
    }

    let mut out = format!(
        "{rule}\n-- Table data: {name}\n{rule}\n",
        rule = BANNER_RULE,
        name = table.name
    );

    match InsertStatement::merge_statements(statements) {
        Ok(Some(merged)) => {
            out.push_str(&merged.generate_insert_statement());
            out.push('\n');
        }
        Ok(None) => {}
        Err(e) => {
            debug!(table = %table.name, error = %e, "Writing statements unmerged");
            for stmt in statements {
                out.push_str(&stmt.generate_insert_statement());
                out.push('\n');
            }
        }
    }

    out.push('\n');
    out
}

/// Buffered writer for rendered table blocks
pub struct TableWriter {
    writer: BufWriter<Box<dyn Write>>,
    write_count: usize,
    max_stmt_buffer: usize,
}

impl TableWriter {
    /// Write into a newly created file
    pub fn new(filename: &Path) -> io::Result<Self> {
        let file = File::create(filename)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    /// Write to standard output
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    pub fn from_writer(inner: Box<dyn Write>) -> Self {
        Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, inner),
            write_count: 0,
            max_stmt_buffer: STMT_BUFFER_COUNT,
        }
    }

    /// Write the data block for one table; tables without statements write nothing
    pub fn write_table(&mut self, table: &Table, statements: &[InsertStatement<'_>]) -> io::Result<()> {
        let block = render_table_data(table, statements);
        if block.is_empty() {
            return Ok(());
        }
        self.writer.write_all(block.as_bytes())?;

        self.write_count += 1;
        if self.write_count >= self.max_stmt_buffer {
            self.write_count = 0;
            self.writer.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.write_count = 0;
        self.writer.flush()
    }
}

/// One `<table>.sql` writer per table under an output directory
pub struct WriterPool {
    output_dir: PathBuf,
    writers: AHashMap<String, TableWriter>,
}

impl WriterPool {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            writers: AHashMap::new(),
        }
    }

    pub fn ensure_output_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    pub fn get_writer(&mut self, table_name: &str) -> io::Result<&mut TableWriter> {
        use std::collections::hash_map::Entry;

        match self.writers.entry(table_name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let filename = self.output_dir.join(format!("{}.sql", table_name));
                let writer = TableWriter::new(&filename)?;
                Ok(entry.insert(writer))
            }
        }
    }

    /// Write a table's block to its own file; no file is created for empty tables
    pub fn write_table(&mut self, table: &Table, statements: &[InsertStatement<'_>]) -> io::Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        self.get_writer(&table.name)?.write_table(table, statements)
    }

    pub fn close_all(&mut self) -> io::Result<()> {
        for (_, writer) in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Destination for generated data
pub enum OutputSink {
    /// Every table into one stream
    Single(TableWriter),
    /// One file per table
    PerTable(WriterPool),
}

impl OutputSink {
    /// Write all generated tables in fill order and flush
    pub fn write_generated(&mut self, data: &GeneratedData<'_>) -> io::Result<usize> {
        let mut written = 0;
        for (table, statements) in data {
            if statements.is_empty() {
                continue;
            }
            match self {
                OutputSink::Single(writer) => writer.write_table(table, statements)?,
                OutputSink::PerTable(pool) => pool.write_table(table, statements)?,
            }
            written += 1;
        }

        match self {
            OutputSink::Single(writer) => writer.flush()?,
            OutputSink::PerTable(pool) => pool.close_all()?,
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn test_render_merges_statements() {
        let schema = Schema::parse("CREATE TABLE t (id INT AUTO_INCREMENT, name TEXT)").unwrap();
        let table = &schema.tables()[0];
        let statements = vec![
            InsertStatement::parse(table, "INSERT INTO t (name) VALUES ('a')").unwrap().unwrap(),
            InsertStatement::parse(table, "INSERT INTO t (name) VALUES ('b')").unwrap().unwrap(),
        ];

        assert_eq!(
            render_table_data(table, &statements),
            "-- ==========================\n-- Table data: t\n-- ==========================\n\
             INSERT INTO t (name) VALUES \n\t('a'),\n\t('b');\n\n"
        );
    }

    #[test]
    fn test_render_empty_is_blank() {
        let schema = Schema::parse("CREATE TABLE t (id INT)").unwrap();
        assert_eq!(render_table_data(&schema.tables()[0], &[]), "");
    }
}

//! Schema creation and the generate-validate-insert loop.
//!
//! Tables are processed in insertion order. For each table the filler keeps
//! asking the oracle for a statement until the engine reports the target row
//! count. Oracle, parse, and engine failures inside the loop are soft: they are
//! logged and the attempt is repeated. Errors while creating the schema or
//! loading example data are fatal.

use crate::engine::{Engine, QueryResult};
use crate::error::{Error, Result};
use crate::oracle::{GenerationRequest, RowOracle};
use crate::progress::FillProgress;
use crate::schema::{
    compute_dependencies, compute_insertion_order, sql_identifier, DependencyMap, Schema, Table,
};
use crate::statement::{InsertStatement, Value};
use ahash::AHashMap;
use tracing::{debug, info, warn};

/// Default number of sample rows handed to the oracle per table
pub const DEFAULT_EXAMPLE_LIMIT: usize = 2;

/// How many rows each table should end up with
#[derive(Debug, Clone, PartialEq)]
pub enum FillTargets {
    /// Same row count for every table
    Uniform(u64),
    /// Row count per table name; tables not listed are not filled
    PerTable(AHashMap<String, u64>),
}

impl FillTargets {
    /// Target for a table, or `None` when the table is not filled
    pub fn target_for(&self, table: &Table) -> Option<u64> {
        match self {
            FillTargets::Uniform(n) => Some(*n),
            FillTargets::PerTable(map) => map.get(&table.name).copied().or_else(|| {
                map.iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&table.name))
                    .map(|(_, n)| *n)
            }),
        }
    }
}

/// Knobs for the fill loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillOptions {
    /// Sample rows queried per table for oracle context
    pub example_limit: usize,
    /// Stop a table after this many failed attempts in a row; `None` retries forever
    pub max_consecutive_failures: Option<usize>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            example_limit: DEFAULT_EXAMPLE_LIMIT,
            max_consecutive_failures: None,
        }
    }
}

/// Statements recorded per filled table, in fill order
pub type GeneratedData<'a> = Vec<(&'a Table, Vec<InsertStatement<'a>>)>;

/// Create every table on the engine, dependencies first
pub fn create_schema(schema: &Schema, engine: &mut dyn Engine) -> Result<()> {
    let order = compute_insertion_order(&compute_dependencies(schema))?;

    for id in order {
        let Some(table) = schema.table(id) else {
            continue;
        };
        for ddl in engine.table_ddl(table) {
            engine.execute(&ddl)?;
        }
        debug!(table = %table.name, "Created table");
    }

    Ok(())
}

/// Execute pre-built statements table by table in insertion order.
///
/// Every statement must target a table of `schema`.
pub fn insert_data(schema: &Schema, statements: &[InsertStatement<'_>], engine: &mut dyn Engine) -> Result<()> {
    let order = compute_insertion_order(&compute_dependencies(schema))?;

    for stmt in statements {
        let known = schema
            .table(stmt.table().id)
            .map(|t| t == stmt.table())
            .unwrap_or(false);
        if !known || !order.contains(&stmt.table().id) {
            return Err(Error::TableNotInOrder(stmt.table().name.clone()));
        }
    }

    for id in order {
        let mut rows = 0;
        for stmt in statements.iter().filter(|s| s.table().id == id) {
            engine.execute(&stmt.generate_insert_statement())?;
            rows += stmt.len();
        }
        if rows > 0 {
            if let Some(table) = schema.table(id) {
                info!(table = %table.name, rows, "Inserted example data");
            }
        }
    }

    Ok(())
}

/// Fill every targeted table in insertion order
pub fn fill_schema<'a>(
    schema: &'a Schema,
    engine: &mut dyn Engine,
    oracle: &mut dyn RowOracle,
    targets: &FillTargets,
    options: &FillOptions,
    progress: &mut FillProgress,
) -> Result<GeneratedData<'a>> {
    let deps = compute_dependencies(schema);
    let order = compute_insertion_order(&deps)?;

    let planned: Vec<(&'a Table, u64)> = order
        .iter()
        .filter_map(|id| schema.table(*id))
        .filter_map(|table| targets.target_for(table).map(|target| (table, target)))
        .collect();
    progress.set_tables_total(planned.len());

    let mut generated = Vec::with_capacity(planned.len());
    for (table, target) in planned {
        let statements = fill_table(schema, &deps, table, engine, oracle, target, options, progress)?;
        generated.push((table, statements));
    }

    Ok(generated)
}

/// Generate statements for one table until it holds `target` rows.
///
/// Only the initial row count can fail the call; everything after it is
/// retried.
#[allow(clippy::too_many_arguments)]
pub fn fill_table<'a>(
    schema: &'a Schema,
    deps: &DependencyMap,
    table: &'a Table,
    engine: &mut dyn Engine,
    oracle: &mut dyn RowOracle,
    target: u64,
    options: &FillOptions,
    progress: &mut FillProgress,
) -> Result<Vec<InsertStatement<'a>>> {
    let count_sql = table.count_sql();
    let mut count = engine.query_count(&count_sql)?;
    progress.advance_table(&table.name, target.saturating_sub(count));
    info!(table = %table.name, rows = count, target, "Filling table");

    let dependencies: Vec<&'a Table> = deps
        .dependencies(table.id)
        .iter()
        .filter_map(|id| schema.table(*id))
        .collect();

    let mut statements = Vec::new();
    let mut failures = 0usize;

    while count < target {
        if let Some(max) = options.max_consecutive_failures {
            if failures >= max {
                warn!(
                    table = %table.name,
                    rows = count,
                    target,
                    failures,
                    "Giving up on table after consecutive failures"
                );
                break;
            }
        }

        let request = GenerationRequest {
            table,
            row_count: count,
            examples: sample_rows(engine, table, options.example_limit),
            dependency_examples: dependencies
                .iter()
                .map(|dep| (*dep, sample_rows(engine, dep, options.example_limit)))
                .collect(),
        };

        let proposal = oracle.generate(&request);
        let mut stmt = match parse_proposal(table, &proposal) {
            Ok(stmt) => stmt,
            Err(reason) => {
                debug!(table = %table.name, reason = %reason, "Discarding oracle output");
                failures += 1;
                continue;
            }
        };

        let sql = stmt.generate_insert_statement();
        if let Err(e) = engine.execute(&sql) {
            debug!(table = %table.name, error = %e, sql = %sql, "Insert rejected by engine");
            failures += 1;
            continue;
        }
        failures = 0;

        backfill_auto_increment(engine, &mut stmt);
        let inserted = stmt.len();
        statements.push(stmt);
        for _ in 0..inserted {
            progress.row_generated();
        }

        count = match engine.query_count(&count_sql) {
            Ok(n) => n,
            Err(e) => {
                debug!(table = %table.name, error = %e, "Row count failed, counting locally");
                count + inserted as u64
            }
        };
    }

    info!(
        table = %table.name,
        rows = count,
        statements = statements.len(),
        "Finished table"
    );
    Ok(statements)
}

/// Turn oracle output into a non-empty statement, or explain why not
fn parse_proposal<'a>(table: &'a Table, proposal: &str) -> std::result::Result<InsertStatement<'a>, String> {
    if proposal.trim().is_empty() {
        return Err("empty oracle output".to_string());
    }
    match InsertStatement::parse(table, proposal) {
        Ok(Some(stmt)) if !stmt.is_empty() => Ok(stmt),
        Ok(_) => Err("oracle output is not an INSERT".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Random sample of a table's rows; a failing query yields no rows
fn sample_rows(engine: &mut dyn Engine, table: &Table, limit: usize) -> QueryResult {
    match engine.query(&table.select_random_sql(limit)) {
        Ok(result) => result,
        Err(e) => {
            debug!(table = %table.name, error = %e, "Example query failed");
            QueryResult::default()
        }
    }
}

/// Write engine-assigned keys back into the statement's rows.
///
/// Assumes the rows just inserted hold the highest values of each
/// auto-increment column.
fn backfill_auto_increment(engine: &mut dyn Engine, stmt: &mut InsertStatement<'_>) {
    let table = stmt.table();
    let rows = stmt.len() as i64;

    for column in table.auto_increment_columns() {
        let sql = format!(
            "SELECT MAX({}) FROM {}",
            sql_identifier(&column.name),
            sql_identifier(&table.name)
        );
        match engine.query(&sql).map(|r| r.scalar().cloned()) {
            Ok(Some(Value::Int(max))) => {
                stmt.set_auto_increment_values_incrementing(column.ordinal, max - rows + 1);
            }
            Ok(other) => {
                debug!(table = %table.name, column = %column.name, value = ?other, "No key to backfill");
            }
            Err(e) => {
                debug!(table = %table.name, column = %column.name, error = %e, "Key backfill failed");
            }
        }
    }
}

//! Order command - print the fill order of a schema's tables.

use crate::error::Error;
use crate::schema::{
    compute_dependencies, compute_drop_order, compute_insertion_order, DependencyMap, Schema, TableId,
};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

/// Run the order command
pub fn run(schema_path: PathBuf, reverse: bool) -> Result<()> {
    if !schema_path.exists() {
        bail!("schema file does not exist: {}", schema_path.display());
    }

    let text = fs::read_to_string(&schema_path)
        .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;
    let schema = Schema::parse(&text).context("Failed to parse schema")?;

    if schema.is_empty() {
        eprintln!("No tables found in the file.");
        return Ok(());
    }

    let deps = compute_dependencies(&schema);
    let order = if reverse {
        compute_drop_order(&deps)
    } else {
        compute_insertion_order(&deps)
    };

    let order = match order {
        Ok(order) => order,
        Err(Error::CyclicDependency { tables }) => {
            eprintln!("\nWarning: Circular dependencies detected!");
            eprintln!("The following tables are part of cycles:");
            for table in &tables {
                eprintln!("  - {}", table);
            }
            bail!("cannot determine a fill order due to cycles");
        }
        Err(e) => return Err(e.into()),
    };

    let label = if reverse { "Drop" } else { "Fill" };
    eprintln!("{} order ({} tables):", label, order.len());

    for (i, id) in order.iter().enumerate() {
        let Some(name) = deps.table_name(*id) else {
            continue;
        };
        println!("{:>3}. {}", i + 1, name);

        let direct = deps.dependencies(*id);
        if !direct.is_empty() {
            println!("       depends on: {}", names(&deps, direct));
        }
        let indirect: Vec<TableId> = deps
            .ancestors(*id)
            .into_iter()
            .filter(|a| !direct.contains(a))
            .collect();
        if !indirect.is_empty() {
            println!("       indirectly: {}", names(&deps, &indirect));
        }
        let dependents = deps.dependents(*id);
        if !dependents.is_empty() {
            println!("       referenced by: {}", names(&deps, dependents));
        }
    }

    Ok(())
}

fn names(deps: &DependencyMap, ids: &[TableId]) -> String {
    ids.iter()
        .filter_map(|id| deps.table_name(*id))
        .collect::<Vec<_>>()
        .join(", ")
}

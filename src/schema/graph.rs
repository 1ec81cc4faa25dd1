//! Table dependency map for FK-aware filling.
//!
//! Provides:
//! - Dependency map construction from resolved column references
//! - Fixed-point insertion ordering (dependencies before dependents)
//! - Cycle detection when no ordering exists

use super::{Schema, TableId};
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Table → tables it references through any column's foreign key.
///
/// Edges are stored both ways:
/// - `dependencies[t]`: tables `t` references (must be filled before `t`)
/// - `dependents[t]`: tables referencing `t`
///
/// A table referencing itself is not recorded; its rows can point at NULL or
/// at rows inserted earlier, so it never blocks ordering.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    /// Table names indexed by TableId, used for diagnostics
    names: Vec<String>,
    dependencies: Vec<Vec<TableId>>,
    dependents: Vec<Vec<TableId>>,
}

impl DependencyMap {
    /// Create a map over `names` (indexed by TableId) with no edges
    pub fn new(names: Vec<String>) -> Self {
        let n = names.len();
        Self {
            names,
            dependencies: vec![Vec::new(); n],
            dependents: vec![Vec::new(); n],
        }
    }

    /// Build the map from every resolved column reference in a schema
    pub fn from_schema(schema: &Schema) -> Self {
        let mut map = Self::new(schema.iter().map(|t| t.name.clone()).collect());

        for table in schema.iter() {
            for column in &table.columns {
                if let Some(reference) = column.reference {
                    map.add_dependency(table.id, reference.table);
                }
            }
        }

        map
    }

    /// Record that `table` references `dependency`. Duplicates and self edges are ignored.
    pub fn add_dependency(&mut self, table: TableId, dependency: TableId) {
        if table == dependency {
            return;
        }
        let deps = &mut self.dependencies[table.0 as usize];
        if !deps.contains(&dependency) {
            deps.push(dependency);
            self.dependents[dependency.0 as usize].push(table);
        }
    }

    /// Number of tables in the map
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of a table, if the ID is in range
    pub fn table_name(&self, id: TableId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|s| s.as_str())
    }

    /// Tables directly referenced by `id`, in the order references were declared
    pub fn dependencies(&self, id: TableId) -> &[TableId] {
        self.dependencies
            .get(id.0 as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Tables directly referencing `id`
    pub fn dependents(&self, id: TableId) -> &[TableId] {
        self.dependents
            .get(id.0 as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All tables `id` depends on, directly or transitively
    pub fn ancestors(&self, id: TableId) -> Vec<TableId> {
        let mut ancestors = Vec::new();
        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            for &dep in self.dependencies(current) {
                if dep != id && !visited[dep.0 as usize] {
                    visited[dep.0 as usize] = true;
                    ancestors.push(dep);
                    queue.push_back(dep);
                }
            }
        }

        ancestors
    }
}

/// Compute the dependency map of a schema
pub fn compute_dependencies(schema: &Schema) -> DependencyMap {
    DependencyMap::from_schema(schema)
}

/// Order tables so every table follows all of its dependencies.
///
/// Each pass walks the unplaced tables in declaration order and places every
/// table whose dependencies are already placed, so ties keep declaration order
/// and the result is deterministic. A pass that places nothing while tables
/// remain means a cycle, reported with the names of the unplaced tables.
pub fn compute_insertion_order(deps: &DependencyMap) -> Result<Vec<TableId>> {
    let n = deps.len();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let mut progressed = false;

        for i in 0..n {
            if placed[i] {
                continue;
            }
            let id = TableId(i as u32);
            if deps
                .dependencies(id)
                .iter()
                .all(|dep| placed[dep.0 as usize])
            {
                placed[i] = true;
                order.push(id);
                progressed = true;
            }
        }

        if !progressed {
            let tables = (0..n)
                .filter(|&i| !placed[i])
                .filter_map(|i| deps.table_name(TableId(i as u32)))
                .map(str::to_string)
                .collect();
            return Err(Error::CyclicDependency { tables });
        }
    }

    Ok(order)
}

/// Order for dropping tables: the exact reverse of the insertion order
pub fn compute_drop_order(deps: &DependencyMap) -> Result<Vec<TableId>> {
    let mut order = compute_insertion_order(deps)?;
    order.reverse();
    Ok(order)
}

//! Pipeline-of-tragedy flow diagram.
//!
//! Flow runs in two stages: each macro region feeds the conflict types it
//! has recorded deaths for, and every conflict type feeds one terminal node
//! with the sum across regions.

use crate::config::SankeyConfig;
use crate::dataset::{DatasetError, Table};
use crate::models::{SankeyDiagram, SankeyLink, SankeyNode};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Assigns node indices on first sight.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<SankeyNode>,
    index: HashMap<String, usize>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, registering it at the end if it is new.
    pub fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(SankeyNode {
            name: name.to_string(),
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Consume the registry, returning nodes in index order.
    pub fn into_nodes(self) -> Vec<SankeyNode> {
        self.nodes
    }
}

/// Build the region → conflict type → terminal diagram.
pub fn build_sankey(table: &Table, settings: &SankeyConfig) -> Result<SankeyDiagram, DatasetError> {
    let entity_col = table.column(&settings.entity_column)?;
    let year_col = table.column(&settings.year_column)?;
    let type_cols = settings
        .conflict_types
        .iter()
        .map(|t| table.column(&t.column))
        .collect::<Result<Vec<_>, _>>()?;

    let mut registry = NodeRegistry::new();
    let mut links = Vec::new();
    let mut totals = vec![0u64; settings.conflict_types.len()];
    let mut regions_seen = 0usize;

    for row in table.rows() {
        if row.integer(year_col)? != Some(settings.year) {
            continue;
        }

        let entity = row.text(entity_col);
        if !settings.regions.iter().any(|r| r == entity) {
            continue;
        }
        regions_seen += 1;

        let region = settings
            .renames
            .get(entity)
            .map(String::as_str)
            .unwrap_or(entity);
        let source = registry.get_or_insert(region);

        for ((conflict_type, &col), total) in settings
            .conflict_types
            .iter()
            .zip(type_cols.iter())
            .zip(totals.iter_mut())
        {
            // fractions below one truncate to nothing
            let Some(value) = row.count(col)? else {
                continue;
            };

            let target = registry.get_or_insert(&conflict_type.label);
            links.push(SankeyLink {
                source,
                target,
                value,
            });
            *total = total
                .checked_add(value)
                .ok_or_else(|| DatasetError::SumOverflow {
                    path: table.source().to_path_buf(),
                    column: conflict_type.column.clone(),
                })?;
        }
    }

    if regions_seen == 0 {
        warn!(
            "No region rows for year {} in {}",
            settings.year,
            table.source().display()
        );
    }

    let terminal = registry.get_or_insert(&settings.terminal);

    for (conflict_type, &total) in settings.conflict_types.iter().zip(totals.iter()) {
        if total == 0 {
            continue;
        }

        let source = registry.get_or_insert(&conflict_type.label);
        links.push(SankeyLink {
            source,
            target: terminal,
            value: total,
        });
        debug!("{} -> {}: {}", conflict_type.label, settings.terminal, total);
    }

    info!(
        "Sankey built from {} region rows: {} nodes, {} links",
        regions_seen,
        registry.len(),
        links.len()
    );

    Ok(SankeyDiagram {
        nodes: registry.into_nodes(),
        links,
    })
}

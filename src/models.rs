//! Data models for the conflict atlas.
//!
//! This module contains the records and derived structures passed between
//! the loaders, the generators and the writers: fatalities records, the
//! structural-twins network, the Sankey flow diagram and the regional and
//! distribution summaries.

use serde::{Deserialize, Serialize};

/// Civilian fatalities for one country in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalityRecord {
    /// Country name as it appears in the source data.
    pub country: String,
    /// Calendar year.
    pub year: i32,
    /// Sum of reported fatalities over all raw rows for this country and year.
    pub fatalities: f64,
}

/// A country in the structural-twins network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Country name; doubles as the node identifier.
    pub id: String,
    /// Raw (unscaled) deadliness value, used for visual sizing.
    pub size: Option<f64>,
    /// Conflict-index level label, copied from the source row.
    pub level: String,
}

/// Undirected similarity edge between two countries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Country the neighbour search started from.
    pub source: String,
    /// Neighbouring country.
    pub target: String,
}

impl NetworkLink {
    /// Returns the endpoints ordered so that `(a, b)` and `(b, a)` share a key.
    pub fn pair_key(&self) -> (String, String) {
        if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        }
    }
}

/// The structural-twins graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    /// One node per surviving input row.
    pub nodes: Vec<NetworkNode>,
    /// Deduplicated nearest-neighbour edges.
    pub links: Vec<NetworkLink>,
}

/// A named node of the Sankey diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyNode {
    /// Display name.
    pub name: String,
}

/// A valued, directed Sankey edge between node positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyLink {
    /// Index of the source node in [`SankeyDiagram::nodes`].
    pub source: usize,
    /// Index of the target node in [`SankeyDiagram::nodes`].
    pub target: usize,
    /// Number of deaths carried by this edge.
    pub value: u64,
}

/// Two-stage flow diagram: region → conflict type → terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyDiagram {
    /// Nodes in first-seen order.
    pub nodes: Vec<SankeyNode>,
    /// Edges in emission order.
    pub links: Vec<SankeyLink>,
}

impl SankeyDiagram {
    /// Looks up a node index by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Sum of values on edges ending at `target`.
    pub fn inflow(&self, target: usize) -> u64 {
        self.links
            .iter()
            .filter(|l| l.target == target)
            .map(|l| l.value)
            .sum()
    }

    /// Sum of values on edges leaving `source`.
    pub fn outflow(&self, source: usize) -> u64 {
        self.links
            .iter()
            .filter(|l| l.source == source)
            .map(|l| l.value)
            .sum()
    }
}

/// The document written by `export`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Structural-twins graph.
    pub network: NetworkGraph,
    /// Pipeline-of-tragedy flow.
    pub sankey: SankeyDiagram,
}

/// Civilian fatalities of one region in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionYearTotal {
    pub year: i32,
    pub region: String,
    /// Zero when no country of the region reported that year.
    pub fatalities: f64,
}

/// Five-number summary plus mean of one country's annual fatalities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub country: String,
    /// Number of years with positive fatalities.
    pub years: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

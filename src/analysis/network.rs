//! Structural-twins network.
//!
//! Countries at a significant conflict-index level are compared on three
//! scaled features. After z-score standardization each country is linked to
//! its nearest neighbours, found through an R*-tree over the feature space.

use crate::config::NetworkConfig;
use crate::dataset::{DatasetError, Table};
use crate::models::{NetworkGraph, NetworkLink, NetworkNode};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Point in standardized feature space, tagged with its row position.
type FeaturePoint = GeomWithData<[f64; 3], usize>;

/// Errors raised while building the network.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Reading the conflict index failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// No row survived the level and missing-value filters.
    #[error("no rows in {source_name} match levels {levels:?} with complete features")]
    EmptySelection {
        source_name: String,
        levels: Vec<String>,
    },
}

/// A row that survived filtering.
#[derive(Debug, Clone)]
struct Candidate {
    country: String,
    level: String,
    size: Option<f64>,
    features: [f64; 3],
}

/// Build the structural-twins graph from an ACLED conflict-index table.
pub fn build_network(table: &Table, settings: &NetworkConfig) -> Result<NetworkGraph, NetworkError> {
    let candidates = select_candidates(table, settings)?;

    if candidates.is_empty() {
        return Err(NetworkError::EmptySelection {
            source_name: table.source().display().to_string(),
            levels: settings.levels.clone(),
        });
    }

    info!(
        "{} of {} countries kept for the network",
        candidates.len(),
        table.len()
    );

    let features: Vec<[f64; 3]> = candidates.iter().map(|c| c.features).collect();
    let standardized = standardize(&features);
    let neighbours = nearest_neighbours(&standardized, settings.neighbors);

    let nodes = candidates
        .iter()
        .map(|c| NetworkNode {
            id: c.country.clone(),
            size: c.size,
            level: c.level.clone(),
        })
        .collect();

    let mut links = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (i, row_neighbours) in neighbours.iter().enumerate() {
        for &j in row_neighbours {
            let link = NetworkLink {
                source: candidates[i].country.clone(),
                target: candidates[j].country.clone(),
            };

            if link.source == link.target {
                debug!("Skipping self-link for duplicated country {}", link.source);
                continue;
            }

            if seen.insert(link.pair_key()) {
                links.push(link);
            }
        }
    }

    debug!("Network has {} links", links.len());

    Ok(NetworkGraph { nodes, links })
}

/// Keep rows at one of the configured levels with all features present.
fn select_candidates(table: &Table, settings: &NetworkConfig) -> Result<Vec<Candidate>, DatasetError> {
    let id_col = table.column(&settings.id_column)?;
    let level_col = table.column(&settings.level_column)?;
    let size_col = table.column(&settings.size_column)?;
    let feature_cols = [
        table.column(&settings.features[0])?,
        table.column(&settings.features[1])?,
        table.column(&settings.features[2])?,
    ];

    let mut candidates = Vec::new();

    for row in table.rows() {
        let level = row.text(level_col);
        if !settings.levels.iter().any(|l| l == level) {
            continue;
        }

        let mut features = [0.0; 3];
        let mut complete = true;
        for (slot, &col) in features.iter_mut().zip(feature_cols.iter()) {
            match row.number(col)? {
                Some(v) => *slot = v,
                None => complete = false,
            }
        }

        if !complete {
            debug!("Dropping {}: missing feature values", row.text(id_col));
            continue;
        }

        candidates.push(Candidate {
            country: row.text(id_col).to_string(),
            level: level.to_string(),
            size: row.number(size_col)?,
            features,
        });
    }

    Ok(candidates)
}

/// Z-score each column using the population standard deviation.
///
/// Constant columns are centered but left unscaled.
fn standardize(rows: &[[f64; 3]]) -> Vec<[f64; 3]> {
    if rows.is_empty() {
        return Vec::new();
    }

    let n = rows.len() as f64;
    let mut mean = [0.0; 3];
    let mut scale = [0.0; 3];

    for d in 0..3 {
        mean[d] = rows.iter().map(|r| r[d]).sum::<f64>() / n;
        let variance = rows.iter().map(|r| (r[d] - mean[d]).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        scale[d] = if std > f64::EPSILON { std } else { 1.0 };
    }

    rows.iter()
        .map(|r| {
            [
                (r[0] - mean[0]) / scale[0],
                (r[1] - mean[1]) / scale[1],
                (r[2] - mean[2]) / scale[2],
            ]
        })
        .collect()
}

/// For each point, the positions of its `k` nearest other points, nearest first.
fn nearest_neighbours(points: &[[f64; 3]], k: usize) -> Vec<Vec<usize>> {
    let tree: RTree<FeaturePoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| FeaturePoint::new(*p, i))
            .collect(),
    );

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            tree.nearest_neighbor_iter(p)
                .map(|hit| hit.data)
                .filter(|&j| j != i)
                .take(k)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Country,Index Level,Deadliness Value,Deadliness Value Scaled,Diffusion Value Scaled,Fragmentation Value Scaled\n";

    fn table(rows: &str) -> Table {
        Table::from_reader(format!("{HEADER}{rows}").as_bytes(), "acled.csv").unwrap()
    }

    #[test]
    fn test_standardize_zero_mean_unit_variance() {
        let rows = vec![[1.0, 10.0, 5.0], [2.0, 20.0, 5.0], [3.0, 30.0, 5.0]];
        let z = standardize(&rows);

        for d in 0..3 {
            let mean: f64 = z.iter().map(|r| r[d]).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
        }
        let var: f64 = z.iter().map(|r| r[0] * r[0]).sum::<f64>() / 3.0;
        assert!((var - 1.0).abs() < 1e-12);
        // constant column stays at zero
        assert!(z.iter().all(|r| r[2] == 0.0));
    }

    #[test]
    fn test_nearest_neighbours_excludes_self() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [5.0, 0.0, 0.0], [5.5, 0.0, 0.0]];
        let nn = nearest_neighbours(&points, 2);

        assert_eq!(nn[0], vec![1, 2]);
        assert_eq!(nn[3], vec![2, 1]);
        for (i, row) in nn.iter().enumerate() {
            assert_eq!(row.len(), 2);
            assert!(!row.contains(&i));
        }
    }

    #[test]
    fn test_nearest_neighbours_small_input() {
        let nn = nearest_neighbours(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], 2);
        assert_eq!(nn, vec![vec![1], vec![0]]);
        assert_eq!(nearest_neighbours(&[[0.0, 0.0, 0.0]], 2), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_build_network_filters_levels_and_missing_features() {
        let t = table(
            "Palestine,Extreme,1.0,0.9,0.8,0.7\n\
             Myanmar,Extreme,0.5,0.8,0.9,0.9\n\
             Mexico,High,0.4,0.7,0.6,0.5\n\
             Nigeria,Turbulent,0.3,0.2,0.3,0.4\n\
             Norway,Low,0.0,0.0,0.0,0.0\n\
             Haiti,High,0.2,,0.5,0.5\n",
        );
        let graph = build_network(&t, &NetworkConfig::default()).unwrap();
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

        assert_eq!(ids, vec!["Palestine", "Myanmar", "Mexico", "Nigeria"]);
        assert_eq!(graph.nodes[0].size, Some(1.0));
        assert_eq!(graph.nodes[2].level, "High");
    }

    #[test]
    fn test_build_network_has_no_self_loops_or_duplicates() {
        let t = table(
            "A,Extreme,1,0.1,0.2,0.3\n\
             B,Extreme,2,0.2,0.1,0.3\n\
             C,High,3,0.9,0.8,0.7\n\
             D,High,4,0.8,0.9,0.7\n\
             E,Turbulent,5,0.5,0.5,0.5\n\
             F,Turbulent,6,0.4,0.6,0.5\n",
        );
        let graph = build_network(&t, &NetworkConfig::default()).unwrap();

        let mut keys = HashSet::new();
        for link in &graph.links {
            assert_ne!(link.source, link.target);
            assert!(keys.insert(link.pair_key()), "duplicate link {:?}", link);
        }
        // every node links to at least one twin
        for node in &graph.nodes {
            assert!(graph
                .links
                .iter()
                .any(|l| l.source == node.id || l.target == node.id));
        }
        // at most k links emitted per source row
        assert!(graph.links.len() <= graph.nodes.len() * 2);
    }

    #[test]
    fn test_mutual_neighbours_produce_one_edge() {
        let t = table(
            "A,Extreme,1,0.0,0.0,0.0\n\
             B,Extreme,1,0.1,0.0,0.0\n",
        );
        let graph = build_network(&t, &NetworkConfig::default()).unwrap();
        assert_eq!(
            graph.links,
            vec![NetworkLink {
                source: "A".to_string(),
                target: "B".to_string()
            }]
        );
    }

    #[test]
    fn test_build_network_rejects_infinite_feature() {
        let t = table(
            "A,Extreme,1,inf,0.2,0.3\n\
             B,Extreme,2,0.2,0.1,0.3\n\
             C,High,3,0.9,0.8,0.7\n",
        );
        let err = build_network(&t, &NetworkConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Dataset(DatasetError::InvalidNumber { ref column, .. })
                if column == "Deadliness Value Scaled"
        ));
    }

    #[test]
    fn test_duplicated_features_still_get_two_neighbours() {
        let points = vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [4.0, 0.0, 0.0]];
        let nn = nearest_neighbours(&points, 2);

        for (i, row) in nn.iter().enumerate() {
            assert_eq!(row.len(), 2);
            assert!(!row.contains(&i));
            assert_ne!(row[0], row[1]);
        }
        // the outlier's twins are two of the identical rows
        assert!(nn[3].iter().all(|&j| j < 3));
    }

    #[test]
    fn test_build_network_empty_selection() {
        let t = table("Norway,Low,0,0,0,0\n");
        let err = build_network(&t, &NetworkConfig::default()).unwrap_err();
        assert!(matches!(err, NetworkError::EmptySelection { .. }));
    }

    #[test]
    fn test_build_network_missing_column() {
        let t = Table::from_reader("Country,Index Level\nMali,High\n".as_bytes(), "acled.csv").unwrap();
        let err = build_network(&t, &NetworkConfig::default()).unwrap_err();
        assert!(matches!(err, NetworkError::Dataset(DatasetError::MissingColumn { .. })));
    }
}

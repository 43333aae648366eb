//! Output generation.
//!
//! Serializes the export bundle to JSON and builds the console summaries
//! printed after each command.

use crate::analysis::fatalities;
use crate::analysis::regions::{self, LinkMix};
use crate::models::{BoxStats, Bundle, FatalityRecord, RegionYearTotal};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Generate the pretty-printed JSON document for a bundle.
pub fn generate_json_bundle(bundle: &Bundle) -> Result<String> {
    serde_json::to_string_pretty(bundle).map_err(Into::into)
}

/// Write a bundle to `path`, replacing any previous file.
///
/// The parent directory is created when missing.
pub fn write_json_bundle(bundle: &Bundle, path: &Path) -> Result<()> {
    write_output(path, &generate_json_bundle(bundle)?)
}

/// Write any serializable value as pretty JSON to `path`.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    write_output(path, &serde_json::to_string_pretty(value)?)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// A heavy link of the Sankey diagram, by node name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLine {
    pub source: String,
    pub target: String,
    pub value: u64,
}

/// Headline numbers of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub network_nodes: usize,
    pub network_links: usize,
    pub sankey_nodes: usize,
    pub sankey_links: usize,
    /// Total value leaving nodes that receive no flow (the regions).
    pub source_outflow: u64,
    /// Total value flowing into the terminal node.
    pub terminal_inflow: u64,
    /// Largest links, heaviest first.
    pub top_flows: Vec<FlowLine>,
    /// Network links within and across world regions.
    pub link_mix: LinkMix,
}

impl BundleSummary {
    /// Summarize a bundle, keeping the `top` heaviest flows.
    pub fn from_bundle(bundle: &Bundle, terminal: &str, top: usize) -> Self {
        let sankey = &bundle.sankey;

        let terminal_inflow = sankey
            .index_of(terminal)
            .map(|i| sankey.inflow(i))
            .unwrap_or(0);
        let source_outflow = (0..sankey.nodes.len())
            .filter(|&i| sankey.inflow(i) == 0)
            .map(|i| sankey.outflow(i))
            .sum();

        let mut flows: Vec<FlowLine> = sankey
            .links
            .iter()
            .filter_map(|l| {
                Some(FlowLine {
                    source: sankey.nodes.get(l.source)?.name.clone(),
                    target: sankey.nodes.get(l.target)?.name.clone(),
                    value: l.value,
                })
            })
            .collect();
        flows.sort_by_key(|f| std::cmp::Reverse(f.value));
        flows.truncate(top);

        Self {
            network_nodes: bundle.network.nodes.len(),
            network_links: bundle.network.links.len(),
            sankey_nodes: sankey.nodes.len(),
            sankey_links: sankey.links.len(),
            source_outflow,
            terminal_inflow,
            top_flows: flows,
            link_mix: regions::link_mix(&bundle.network),
        }
    }

    /// Render the summary as console lines.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Network: {} countries, {} twin links",
            self.network_nodes, self.network_links
        ));
        lines.push(format!(
            "         {} within a region, {} across regions",
            self.link_mix.within, self.link_mix.across
        ));
        lines.push(format!(
            "Sankey:  {} nodes, {} flows, {} deaths leave the regions, {} reach the terminal",
            self.sankey_nodes, self.sankey_links, self.source_outflow, self.terminal_inflow
        ));

        if !self.top_flows.is_empty() {
            lines.push("Heaviest flows:".to_string());
            for flow in &self.top_flows {
                lines.push(format!(
                    "  {} -> {}: {}",
                    flow.source, flow.target, flow.value
                ));
            }
        }

        lines.join("\n")
    }
}

/// Per-year fatalities table for the selected countries.
pub fn fatalities_table(records: &[FatalityRecord], countries: &[String]) -> String {
    let mut out = String::new();

    for country in countries {
        let rows = fatalities::for_country(records, country);
        out.push_str(&format!("{}\n", country));

        if rows.is_empty() {
            out.push_str("  (no data)\n");
            continue;
        }

        for r in &rows {
            out.push_str(&format!("  {:>4}  {:>10}\n", r.year, format_count(r.fatalities)));
        }
        out.push_str(&format!(
            "  {:>4}  {:>10}\n",
            "all",
            format_count(fatalities::total(rows.iter().copied()))
        ));
    }

    out
}

/// Region-by-year totals, one row per year and one column per region.
pub fn regions_table(totals: &[RegionYearTotal], regions: &[String]) -> String {
    let mut out = format!("  {:>4}", "year");
    for region in regions {
        out.push_str(&format!("  {:>12}", region));
    }
    out.push('\n');

    for chunk in totals.chunks(regions.len().max(1)) {
        let Some(first) = chunk.first() else {
            continue;
        };
        out.push_str(&format!("  {:>4}", first.year));
        for total in chunk {
            out.push_str(&format!("  {:>12}", format_count(total.fatalities)));
        }
        out.push('\n');
    }

    out
}

/// Distribution summary, one line per country.
pub fn stats_table(stats: &[BoxStats]) -> String {
    let mut out = format!(
        "  {:<24} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
        "country", "years", "min", "q1", "median", "q3", "max", "mean"
    );

    for s in stats {
        out.push_str(&format!(
            "  {:<24} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
            s.country,
            s.years,
            format_count(s.min),
            format_count(s.q1),
            format_count(s.median),
            format_count(s.q3),
            format_count(s.max),
            format_count(s.mean)
        ));
    }

    out
}

/// Whole numbers print without a fractional part.
fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkGraph, NetworkLink, NetworkNode, SankeyDiagram, SankeyLink, SankeyNode};

    fn create_test_bundle() -> Bundle {
        Bundle {
            network: NetworkGraph {
                nodes: vec![
                    NetworkNode {
                        id: "Sudan".to_string(),
                        size: Some(0.9),
                        level: "Extreme".to_string(),
                    },
                    NetworkNode {
                        id: "Mali".to_string(),
                        size: Some(0.4),
                        level: "High".to_string(),
                    },
                ],
                links: vec![NetworkLink {
                    source: "Sudan".to_string(),
                    target: "Mali".to_string(),
                }],
            },
            sankey: SankeyDiagram {
                nodes: vec![
                    SankeyNode { name: "Africa".to_string() },
                    SankeyNode { name: "Intrastate War".to_string() },
                    SankeyNode { name: "Non-state Conflict".to_string() },
                    SankeyNode { name: "Cumulative Human Loss".to_string() },
                ],
                links: vec![
                    SankeyLink { source: 0, target: 1, value: 300 },
                    SankeyLink { source: 0, target: 2, value: 40 },
                    SankeyLink { source: 1, target: 3, value: 300 },
                    SankeyLink { source: 2, target: 3, value: 40 },
                ],
            },
        }
    }

    #[test]
    fn test_generate_json_bundle() {
        let json = generate_json_bundle(&create_test_bundle()).unwrap();

        // indented output
        assert!(json.contains("\n  \"network\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["network"]["links"][0]["source"], "Sudan");
        assert_eq!(value["sankey"]["links"][0]["value"], 300);
        assert_eq!(value["sankey"]["nodes"][3]["name"], "Cumulative Human Loss");
    }

    #[test]
    fn test_write_json_bundle_creates_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("net_data.json");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        write_json_bundle(&create_test_bundle(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Bundle = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, create_test_bundle());
    }

    #[test]
    fn test_bundle_summary() {
        let summary = BundleSummary::from_bundle(&create_test_bundle(), "Cumulative Human Loss", 2);

        assert_eq!(summary.network_nodes, 2);
        assert_eq!(summary.network_links, 1);
        assert_eq!(summary.sankey_nodes, 4);
        assert_eq!(summary.sankey_links, 4);
        assert_eq!(summary.source_outflow, 340);
        assert_eq!(summary.terminal_inflow, 340);
        assert_eq!(summary.top_flows.len(), 2);
        assert_eq!(summary.top_flows[0].value, 300);

        // Sudan and Mali are both in Africa
        assert_eq!(summary.link_mix, LinkMix { within: 1, across: 0 });

        let text = summary.to_text();
        assert!(text.contains("2 countries"));
        assert!(text.contains("1 within a region, 0 across regions"));
        assert!(text.contains("Africa -> Intrastate War: 300"));
    }

    #[test]
    fn test_write_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        let totals = vec![RegionYearTotal {
            year: 2024,
            region: "Asia".to_string(),
            fatalities: 12.0,
        }];

        write_json(&totals, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["region"], "Asia");
        assert_eq!(value[0]["year"], 2024);
    }

    #[test]
    fn test_regions_table() {
        let regions = vec!["Africa".to_string(), "Europe".to_string()];
        let totals = vec![
            RegionYearTotal { year: 2022, region: "Africa".to_string(), fatalities: 15.0 },
            RegionYearTotal { year: 2022, region: "Europe".to_string(), fatalities: 0.0 },
            RegionYearTotal { year: 2023, region: "Africa".to_string(), fatalities: 2.5 },
            RegionYearTotal { year: 2023, region: "Europe".to_string(), fatalities: 7.0 },
        ];
        let table = regions_table(&totals, &regions);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Africa") && lines[0].contains("Europe"));
        assert!(lines[1].starts_with("  2022") && lines[1].ends_with(" 0"));
        assert!(lines[2].contains("2.5") && lines[2].ends_with(" 7"));
    }

    #[test]
    fn test_stats_table() {
        let stats = vec![BoxStats {
            country: "Sudan".to_string(),
            years: 3,
            min: 10.0,
            q1: 15.0,
            median: 20.0,
            q3: 25.0,
            max: 30.0,
            mean: 20.0,
        }];
        let table = stats_table(&stats);
        assert!(table.lines().next().unwrap().contains("median"));
        assert!(table.contains("Sudan"));
        assert!(table.contains("    25"));
    }

    #[test]
    fn test_fatalities_table() {
        let records = vec![
            FatalityRecord {
                country: "Ukraine".to_string(),
                year: 2022,
                fatalities: 120.0,
            },
            FatalityRecord {
                country: "Ukraine".to_string(),
                year: 2023,
                fatalities: 30.5,
            },
        ];
        let countries = vec!["Ukraine".to_string(), "Russia".to_string()];
        let table = fatalities_table(&records, &countries);

        assert!(table.contains("Ukraine\n"));
        assert!(table.contains("2022         120"));
        assert!(table.contains("30.5"));
        assert!(table.contains("150.5"));
        assert!(table.contains("Russia\n  (no data)"));
    }
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.conflict-atlas.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".conflict-atlas.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input dataset locations.
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Output artifact locations.
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// Fatalities chart settings.
    #[serde(default)]
    pub chart: ChartConfig,

    /// Structural-twins network settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Pipeline-of-tragedy Sankey settings.
    #[serde(default)]
    pub sankey: SankeyConfig,

    /// Region-by-year aggregation settings.
    #[serde(default)]
    pub regional: RegionalConfig,

    /// Fatalities distribution settings.
    #[serde(default)]
    pub stats: StatsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Paths of the three source CSV files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputsConfig {
    /// Civilian fatalities by country and year.
    #[serde(default = "default_fatalities_csv")]
    pub fatalities: PathBuf,

    /// ACLED conflict index.
    #[serde(default = "default_conflict_index_csv")]
    pub conflict_index: PathBuf,

    /// Cumulative deaths by region and conflict type.
    #[serde(default = "default_cumulative_deaths_csv")]
    pub cumulative_deaths: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            fatalities: default_fatalities_csv(),
            conflict_index: default_conflict_index_csv(),
            cumulative_deaths: default_cumulative_deaths_csv(),
        }
    }
}

fn default_fatalities_csv() -> PathBuf {
    PathBuf::from("data/number_of_reported_civilian_fatalities_by_country-year_as-of-17Oct2025_0.csv")
}

fn default_conflict_index_csv() -> PathBuf {
    PathBuf::from("data/acled_conflict_index_fullyear2024_allcolumns-2.csv")
}

fn default_cumulative_deaths_csv() -> PathBuf {
    PathBuf::from("data/cumulative-deaths-in-armed-conflicts-by-country-region-and-type.csv")
}

/// Output artifact paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// JSON bundle written by `export`.
    #[serde(default = "default_bundle_output")]
    pub bundle: PathBuf,

    /// SVG chart written by `chart`.
    #[serde(default = "default_chart_output")]
    pub chart: PathBuf,

    /// Optional JSON file written by `regions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<PathBuf>,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            bundle: default_bundle_output(),
            chart: default_chart_output(),
            regions: None,
        }
    }
}

fn default_bundle_output() -> PathBuf {
    PathBuf::from("data/net_data.json")
}

fn default_chart_output() -> PathBuf {
    PathBuf::from("civilian_fatalities.svg")
}

/// Fatalities chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Countries to plot, one subplot each.
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,

    /// Image width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

fn default_countries() -> Vec<String> {
    vec!["Russia".to_string(), "Ukraine".to_string()]
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    500
}

/// Structural-twins network settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Index levels kept in the graph.
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,

    /// Scaled feature columns used for similarity.
    #[serde(default = "default_features")]
    pub features: [String; 3],

    /// Column holding the country name.
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column holding the raw value used for node size.
    #[serde(default = "default_size_column")]
    pub size_column: String,

    /// Column holding the categorical index level.
    #[serde(default = "default_level_column")]
    pub level_column: String,

    /// Neighbours linked per country.
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            features: default_features(),
            id_column: default_id_column(),
            size_column: default_size_column(),
            level_column: default_level_column(),
            neighbors: default_neighbors(),
        }
    }
}

fn default_levels() -> Vec<String> {
    vec!["Extreme", "High", "Turbulent"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_features() -> [String; 3] {
    [
        "Deadliness Value Scaled".to_string(),
        "Diffusion Value Scaled".to_string(),
        "Fragmentation Value Scaled".to_string(),
    ]
}

fn default_id_column() -> String {
    "Country".to_string()
}

fn default_size_column() -> String {
    "Deadliness Value".to_string()
}

fn default_level_column() -> String {
    "Index Level".to_string()
}

fn default_neighbors() -> usize {
    2
}

/// One conflict-type column of the cumulative-deaths dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictType {
    /// CSV column name.
    pub column: String,
    /// Node label shown in the diagram.
    pub label: String,
}

impl ConflictType {
    fn new(column: &str, label: &str) -> Self {
        Self {
            column: column.to_string(),
            label: label.to_string(),
        }
    }
}

/// Pipeline-of-tragedy Sankey settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyConfig {
    /// Year selected from the dataset.
    #[serde(default = "default_year")]
    pub year: i64,

    /// Column holding the region or country name.
    #[serde(default = "default_entity_column")]
    pub entity_column: String,

    /// Column holding the year.
    #[serde(default = "default_year_column")]
    pub year_column: String,

    /// Macro-region entities kept as sources.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Display renames applied to region names.
    #[serde(default = "default_renames")]
    pub renames: BTreeMap<String, String>,

    /// Conflict-type columns, in diagram order.
    #[serde(default = "default_conflict_types")]
    pub conflict_types: Vec<ConflictType>,

    /// Name of the terminal node every conflict type flows into.
    #[serde(default = "default_terminal")]
    pub terminal: String,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            entity_column: default_entity_column(),
            year_column: default_year_column(),
            regions: default_regions(),
            renames: default_renames(),
            conflict_types: default_conflict_types(),
            terminal: default_terminal(),
        }
    }
}

fn default_year() -> i64 {
    2024
}

fn default_entity_column() -> String {
    "Entity".to_string()
}

fn default_year_column() -> String {
    "Year".to_string()
}

fn default_regions() -> Vec<String> {
    vec!["Africa", "Americas", "Asia and Oceania", "Europe", "Middle East"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_renames() -> BTreeMap<String, String> {
    [("Asia and Oceania".to_string(), "Asia".to_string())]
        .into_iter()
        .collect()
}

fn default_conflict_types() -> Vec<ConflictType> {
    vec![
        ConflictType::new("Cumulative deaths in intrastate conflicts", "Intrastate War"),
        ConflictType::new("Cumulative deaths from one-sided violence", "One-sided Violence"),
        ConflictType::new("Cumulative deaths in non-state conflicts", "Non-state Conflict"),
        ConflictType::new("Cumulative deaths in interstate conflicts", "Interstate War"),
    ]
}

fn default_terminal() -> String {
    "Cumulative Human Loss".to_string()
}

/// Region-by-year aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalConfig {
    /// Regions reported, in output order.
    #[serde(default = "default_regional_regions")]
    pub regions: Vec<String>,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            regions: default_regional_regions(),
        }
    }
}

fn default_regional_regions() -> Vec<String> {
    vec!["Africa", "Americas", "Asia", "Europe", "Middle East"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Fatalities distribution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Index level the countries are picked from.
    #[serde(default = "default_stats_level")]
    pub level: String,

    /// Conflict-index column ranking the countries.
    #[serde(default = "default_score_column")]
    pub score_column: String,

    /// Number of countries summarized.
    #[serde(default = "default_stats_top")]
    pub top: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            level: default_stats_level(),
            score_column: default_score_column(),
            top: default_stats_top(),
        }
    }
}

fn default_stats_level() -> String {
    "Extreme".to_string()
}

fn default_score_column() -> String {
    "Total Score".to_string()
}

fn default_stats_top() -> usize {
    7
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `.conflict-atlas.toml` in `dir`
    /// is used when present; if it is broken a warning is printed and the
    /// defaults apply.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::load_from_dir(dir) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Ok(Config::default()),
            Err(e) => {
                eprintln!("Warning: failed to load {}: {:#}", DEFAULT_CONFIG_FILE, e);
                Ok(Config::default())
            }
        }
    }

    /// Try to load `.conflict-atlas.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they explicitly provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Some(Command::Chart(chart)) => {
                if let Some(ref input) = chart.input {
                    self.inputs.fatalities = input.clone();
                }
                if let Some(ref output) = chart.output {
                    self.outputs.chart = output.clone();
                }
                if let Some(ref countries) = chart.countries {
                    self.chart.countries = countries
                        .iter()
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect();
                }
                if let Some(width) = chart.width {
                    self.chart.width = width;
                }
                if let Some(height) = chart.height {
                    self.chart.height = height;
                }
            }
            Some(Command::Export(export)) => {
                if let Some(ref path) = export.conflict_index {
                    self.inputs.conflict_index = path.clone();
                }
                if let Some(ref path) = export.cumulative_deaths {
                    self.inputs.cumulative_deaths = path.clone();
                }
                if let Some(ref output) = export.output {
                    self.outputs.bundle = output.clone();
                }
            }
            Some(Command::Regions(regions)) => {
                if let Some(ref input) = regions.input {
                    self.inputs.fatalities = input.clone();
                }
                if let Some(ref output) = regions.output {
                    self.outputs.regions = Some(output.clone());
                }
            }
            Some(Command::Stats(stats)) => {
                if let Some(ref input) = stats.input {
                    self.inputs.fatalities = input.clone();
                }
                if let Some(ref path) = stats.conflict_index {
                    self.inputs.conflict_index = path.clone();
                }
                if let Some(top) = stats.top {
                    self.stats.top = top;
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default configuration")
    }

    /// Write a default `.conflict-atlas.toml` into `dir`.
    ///
    /// Refuses to overwrite an existing file.
    pub fn write_default(dir: &Path) -> Result<PathBuf> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            bail!(
                "{} already exists. Remove it first or edit it manually.",
                path.display()
            );
        }

        let content = Self::default_toml()?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chart.countries, vec!["Russia", "Ukraine"]);
        assert_eq!(config.network.neighbors, 2);
        assert_eq!(config.sankey.year, 2024);
        assert_eq!(config.sankey.conflict_types.len(), 4);
        assert_eq!(config.sankey.terminal, "Cumulative Human Loss");
        assert_eq!(
            config.sankey.renames.get("Asia and Oceania").map(String::as_str),
            Some("Asia")
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[inputs]
conflict_index = "other/acled.csv"

[chart]
countries = ["Sudan"]

[network]
levels = ["Extreme"]
neighbors = 3

[sankey]
year = 2023
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.inputs.conflict_index, PathBuf::from("other/acled.csv"));
        assert_eq!(config.inputs.fatalities, default_fatalities_csv());
        assert_eq!(config.chart.countries, vec!["Sudan"]);
        assert_eq!(config.chart.width, 1200);
        assert_eq!(config.network.levels, vec!["Extreme"]);
        assert_eq!(config.network.neighbors, 3);
        assert_eq!(config.network.features, default_features());
        assert_eq!(config.sankey.year, 2023);
        assert_eq!(config.sankey.regions.len(), 5);
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[inputs]"));
        assert!(toml_str.contains("[network]"));
        assert!(toml_str.contains("[sankey]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[outputs]\nbundle = \"out/graph.json\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.outputs.bundle, PathBuf::from("out/graph.json"));

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[chart\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_resolve_falls_back_on_broken_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[chart\n").unwrap();

        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolve_explicit_path_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[chart\n").unwrap();
        assert!(Config::resolve(Some(&broken), dir.path()).is_err());

        let missing = dir.path().join("missing.toml");
        assert!(Config::resolve(Some(&missing), dir.path()).is_err());

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[stats]\ntop = 3\n").unwrap();
        let config = Config::resolve(Some(&good), dir.path()).unwrap();
        assert_eq!(config.stats.top, 3);
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::write_default(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(DEFAULT_CONFIG_FILE));
        assert!(Config::load_from_dir(dir.path()).unwrap().is_some());

        std::fs::write(&path, "# edited\n").unwrap();
        assert!(Config::write_default(dir.path()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
    }
}

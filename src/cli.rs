//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conflict Atlas - charts and graph data from conflict-fatality datasets
///
/// Renders civilian-fatality bar charts and exports the structural-twins
/// network and pipeline-of-tragedy Sankey data as JSON.
///
/// Examples:
///   conflict-atlas chart
///   conflict-atlas chart --countries Sudan,Myanmar -o sudan_myanmar.svg
///   conflict-atlas export
///   conflict-atlas export --dry-run
///   conflict-atlas regions -o data/regions.json
///   conflict-atlas stats --top 5
///   conflict-atlas --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .conflict-atlas.toml in the current directory.
    /// Can also be set via the CONFLICT_ATLAS_CONFIG env var.
    #[arg(short, long, value_name = "FILE", global = true, env = "CONFLICT_ATLAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .conflict-atlas.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render civilian fatalities per country and year as bar charts (SVG)
    Chart(ChartArgs),
    /// Build the network and Sankey data and write them as JSON
    Export(ExportArgs),
    /// Sum civilian fatalities per world region and year
    Regions(RegionsArgs),
    /// Summarize annual fatalities of the most severe conflicts
    Stats(StatsArgs),
}

/// Options for `chart`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChartArgs {
    /// Civilian fatalities CSV (country, year, fatalities)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Countries to plot (comma-separated)
    ///
    /// Example: --countries Russia,Ukraine
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Output SVG file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,
}

/// Options for `export`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// ACLED conflict index CSV
    #[arg(long, value_name = "FILE")]
    pub conflict_index: Option<PathBuf>,

    /// Cumulative deaths by region and conflict type CSV
    #[arg(long, value_name = "FILE")]
    pub cumulative_deaths: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Dry run: build and summarize the data without writing the JSON file
    #[arg(long)]
    pub dry_run: bool,
}

/// Options for `regions`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RegionsArgs {
    /// Civilian fatalities CSV (country, year, fatalities)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Also write the totals as JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Options for `stats`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Civilian fatalities CSV (country, year, fatalities)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// ACLED conflict index CSV
    #[arg(long, value_name = "FILE")]
    pub conflict_index: Option<PathBuf>,

    /// Number of countries to summarize
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            None => Err(
                "A command is required: chart, export, regions or stats (see --help)".to_string(),
            ),
            Some(Command::Chart(chart)) => {
                if chart.width == Some(0) || chart.height == Some(0) {
                    return Err("Chart width and height must be at least 1 pixel".to_string());
                }
                if let Some(ref countries) = chart.countries {
                    if countries.iter().all(|c| c.trim().is_empty()) {
                        return Err("At least one country is required".to_string());
                    }
                }
                Ok(())
            }
            Some(Command::Stats(stats)) if stats.top == Some(0) => {
                Err("--top must be at least 1".to_string())
            }
            Some(Command::Export(_)) | Some(Command::Regions(_)) | Some(Command::Stats(_)) => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

//! Command orchestration.
//!
//! Loads the datasets each command needs and runs the generators over them.
//! For `export` the conflict index and the cumulative-deaths dataset feed
//! the bundle. Nothing is written unless every stage succeeds.

use crate::analysis::{build_network, build_sankey, distribution, fatalities, regions};
use crate::config::Config;
use crate::dataset::{DatasetError, Table};
use crate::models::{BoxStats, Bundle, FatalityRecord, RegionYearTotal};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Build the network and Sankey structures described by `config`.
pub fn build_bundle(config: &Config, show_progress: bool) -> Result<Bundle> {
    let conflict_index = load_with_progress(&config.inputs.conflict_index, "ACLED conflict index", show_progress)?;
    let network = build_network(&conflict_index, &config.network)
        .context("Failed to build the structural-twins network")?;
    info!(
        "Network: {} nodes, {} links",
        network.nodes.len(),
        network.links.len()
    );

    let deaths = load_with_progress(&config.inputs.cumulative_deaths, "cumulative deaths", show_progress)?;
    let sankey = build_sankey(&deaths, &config.sankey)
        .context("Failed to build the Sankey diagram")?;
    info!(
        "Sankey: {} nodes, {} links",
        sankey.nodes.len(),
        sankey.links.len()
    );

    Ok(Bundle { network, sankey })
}

/// Load the civilian fatalities dataset as country-year totals.
pub fn load_fatalities(config: &Config, show_progress: bool) -> Result<Vec<FatalityRecord>> {
    let table = load_with_progress(&config.inputs.fatalities, "civilian fatalities", show_progress)?;
    let records = fatalities::aggregate(table)?;
    info!("{} country-year totals", records.len());
    Ok(records)
}

/// Civilian fatalities per configured region and year.
pub fn build_regional(config: &Config, show_progress: bool) -> Result<Vec<RegionYearTotal>> {
    let records = load_fatalities(config, show_progress)?;
    Ok(regions::fatalities_by_region(&records, &config.regional.regions))
}

/// Distribution summaries for the top-scoring countries of the conflict index.
pub fn build_stats(config: &Config, show_progress: bool) -> Result<Vec<BoxStats>> {
    let index = load_with_progress(&config.inputs.conflict_index, "ACLED conflict index", show_progress)?;
    let countries = distribution::top_countries(&index, &config.network, &config.stats)
        .context("Failed to rank countries")?;
    info!("Summarizing {}", countries.join(", "));

    let records = load_fatalities(config, show_progress)?;
    Ok(distribution::country_distributions(&records, &countries))
}

/// Load a table, showing a spinner while it is read.
pub fn load_with_progress(path: &Path, label: &str, show_progress: bool) -> Result<Table, DatasetError> {
    println!("📥 Loading {} from {}", label, path.display());

    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("   {spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("reading {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = Table::load(path);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let table = result?;
    info!("{} rows loaded from {}", table.len(), path.display());
    Ok(table)
}

/// Find a missing-input error anywhere in an error chain.
pub fn missing_input(err: &anyhow::Error) -> Option<&Path> {
    err.chain().find_map(|cause| match cause.downcast_ref::<DatasetError>() {
        Some(DatasetError::NotFound { path }) => Some(path.as_path()),
        _ => None,
    })
}

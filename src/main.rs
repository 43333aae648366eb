//! Conflict Atlas - charts and graph data from conflict-fatality datasets
//!
//! A CLI tool that renders civilian-fatality bar charts and exports the
//! structural-twins network and pipeline-of-tragedy Sankey data as JSON
//! for downstream visualization. It also reports fatalities by world
//! region and the distribution of annual fatalities in the most severe
//! conflicts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing input file, malformed data, config, etc.)

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod pipeline;
mod report;

use anyhow::{bail, Result};
use cli::{Args, Command};
use config::Config;
use report::BundleSummary;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration
    let mut config = match Config::resolve(args.config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("Conflict Atlas v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Some(Command::Chart(_)) => run_chart(&config, !args.quiet),
        Some(Command::Export(ref export)) => run_export(&config, export.dry_run, !args.quiet),
        Some(Command::Regions(_)) => run_regions(&config, !args.quiet),
        Some(Command::Stats(_)) => run_stats(&config, !args.quiet),
        None => Ok(()),
    };

    if let Err(e) = result {
        if let Some(path) = pipeline::missing_input(&e) {
            error!("Input file not found: {}", path.display());
            eprintln!("\n❌ Error: input file not found: {}", path.display());
            eprintln!("   Please ensure the CSV files are in the configured data directory.");
        } else {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .conflict-atlas.toml.
fn handle_init_config() -> Result<()> {
    match Config::write_default(Path::new(".")) {
        Ok(path) => {
            println!("✅ Created {} with default settings.", path.display());
            println!("   Edit it to customize input paths, countries, levels and regions.");
            Ok(())
        }
        Err(e) => {
            eprintln!("⚠️  {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Render the civilian fatalities chart.
fn run_chart(config: &Config, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();

    if config.chart.countries.is_empty() {
        bail!("No countries selected for the chart");
    }

    let table = pipeline::load_with_progress(
        &config.inputs.fatalities,
        "civilian fatalities",
        show_progress,
    )?;
    println!("   Columns: {:?}", table.headers());

    let records = analysis::fatalities::aggregate(table)?;
    info!("{} country-year totals", records.len());

    println!(
        "\n📊 Rendering chart for {}...",
        config.chart.countries.join(", ")
    );
    report::render_fatalities_chart(
        &records,
        &config.chart.countries,
        report::ChartOptions::from(&config.chart),
        &config.outputs.chart,
    )?;

    println!("\n{}", report::fatalities_table(&records, &config.chart.countries));
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Chart saved to: {}",
        config.outputs.chart.display()
    );

    Ok(())
}

/// Build the network and Sankey data and write the JSON bundle.
fn run_export(config: &Config, dry_run: bool, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();

    let bundle = pipeline::build_bundle(config, show_progress)?;
    let summary = BundleSummary::from_bundle(&bundle, &config.sankey.terminal, 5);

    println!("\n📝 Export summary:");
    for line in summary.to_text().lines() {
        println!("   {}", line);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    if dry_run {
        warn!("Dry run: {} not written", config.outputs.bundle.display());
        println!("\n✅ Dry run complete. No file was written.");
        return Ok(());
    }

    report::write_json_bundle(&bundle, &config.outputs.bundle)?;
    println!(
        "\n✅ Success! Data processed and saved to: {}",
        config.outputs.bundle.display()
    );

    Ok(())
}

/// Print civilian fatalities per region and year.
fn run_regions(config: &Config, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();

    let totals = pipeline::build_regional(config, show_progress)?;
    if totals.is_empty() {
        bail!("No fatalities records to aggregate");
    }

    println!("\n🌍 Civilian fatalities by region:");
    println!("{}", report::regions_table(&totals, &config.regional.regions));
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    if let Some(ref output) = config.outputs.regions {
        report::write_json(&totals, output)?;
        println!("\n✅ Regional totals saved to: {}", output.display());
    }

    Ok(())
}

/// Print the distribution of annual fatalities for the top conflicts.
fn run_stats(config: &Config, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();

    let stats = pipeline::build_stats(config, show_progress)?;
    if stats.is_empty() {
        bail!(
            "No '{}' country has positive fatalities to summarize",
            config.stats.level
        );
    }

    println!(
        "\n📈 Annual civilian fatalities, top {} '{}' countries:",
        config.stats.top, config.stats.level
    );
    println!("{}", report::stats_table(&stats));
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

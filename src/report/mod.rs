//! Report generation.
//!
//! JSON output, console summaries and the fatalities chart.

pub mod chart;
pub mod generator;

pub use chart::{render_fatalities_chart, ChartOptions};
pub use generator::{
    fatalities_table, regions_table, stats_table, write_json, write_json_bundle, BundleSummary,
};

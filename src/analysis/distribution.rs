//! Distribution of annual fatalities for the most severe conflicts.
//!
//! The countries are picked from the conflict index (highest total score at
//! one index level) and summarized over their yearly fatalities totals.

use crate::config::{NetworkConfig, StatsConfig};
use crate::dataset::{DatasetError, Table};
use crate::models::{BoxStats, FatalityRecord};
use tracing::{debug, warn};

/// Countries at `stats.level` with the highest score, best first.
///
/// Rows without a score are ignored.
pub fn top_countries(
    table: &Table,
    network: &NetworkConfig,
    stats: &StatsConfig,
) -> Result<Vec<String>, DatasetError> {
    let id_col = table.column(&network.id_column)?;
    let level_col = table.column(&network.level_column)?;
    let score_col = table.column(&stats.score_column)?;

    let mut scored = Vec::new();
    for row in table.rows() {
        if row.text(level_col) != stats.level {
            continue;
        }
        match row.number(score_col)? {
            Some(score) => scored.push((row.text(id_col).to_string(), score)),
            None => debug!("No {} for {}", stats.score_column, row.text(id_col)),
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(stats.top);

    Ok(scored.into_iter().map(|(country, _)| country).collect())
}

/// Box statistics per country over years with positive fatalities.
///
/// Countries without any such year are skipped with a warning.
pub fn country_distributions(records: &[FatalityRecord], countries: &[String]) -> Vec<BoxStats> {
    countries
        .iter()
        .filter_map(|country| {
            let values: Vec<f64> = records
                .iter()
                .filter(|r| &r.country == country && r.fatalities > 0.0)
                .map(|r| r.fatalities)
                .collect();

            let stats = box_stats(country, values);
            if stats.is_none() {
                warn!("No positive fatalities recorded for {}", country);
            }
            stats
        })
        .collect()
}

/// Summarize `values`; `None` when empty.
pub fn box_stats(country: &str, mut values: Vec<f64>) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    Some(BoxStats {
        country: country.to_string(),
        years: n,
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[n - 1],
        mean: values.iter().sum::<f64>() / n as f64,
    })
}

/// Linear-interpolation quantile of sorted, non-empty `values`.
fn quantile(values: &[f64], p: f64) -> f64 {
    let pos = (values.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(values.len() - 1);
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}

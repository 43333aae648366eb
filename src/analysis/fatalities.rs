//! Civilian fatalities aggregation.
//!
//! Sums reported fatalities per country and year, after normalizing the
//! header casing of the source file.

use crate::dataset::{DatasetError, Table};
use crate::models::FatalityRecord;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Group the table by (Country, Year) and sum Fatalities.
///
/// Headers are normalized first, so `COUNTRY` and `country` both resolve.
/// Missing fatality cells contribute nothing to the sum. Rows without a
/// country or year are skipped. The result is sorted by country, then year.
pub fn aggregate(mut table: Table) -> Result<Vec<FatalityRecord>, DatasetError> {
    table.normalize_headers();
    if table.is_empty() {
        warn!("{} has no data rows", table.source().display());
    }

    let country_col = table.column("Country")?;
    let year_col = table.column("Year")?;
    let fatalities_col = table.column("Fatalities")?;

    let mut totals: BTreeMap<(String, i32), f64> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in table.rows() {
        let country = row.text(country_col);
        let year = row.integer(year_col)?;

        let (country, year) = match (country.is_empty(), year) {
            (false, Some(year)) => (country.to_string(), year as i32),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let fatalities = row.number(fatalities_col)?.unwrap_or(0.0);
        *totals.entry((country, year)).or_insert(0.0) += fatalities;
    }

    if skipped > 0 {
        debug!("Skipped {} rows without country or year", skipped);
    }

    Ok(totals
        .into_iter()
        .map(|((country, year), fatalities)| FatalityRecord {
            country,
            year,
            fatalities,
        })
        .collect())
}

/// Records for a single country, in year order.
pub fn for_country<'a>(records: &'a [FatalityRecord], country: &str) -> Vec<&'a FatalityRecord> {
    records.iter().filter(|r| r.country == country).collect()
}

/// First and last year present in `records`.
pub fn year_span<'a, I>(records: I) -> Option<(i32, i32)>
where
    I: IntoIterator<Item = &'a FatalityRecord>,
{
    records.into_iter().fold(None, |span, r| match span {
        None => Some((r.year, r.year)),
        Some((lo, hi)) => Some((lo.min(r.year), hi.max(r.year))),
    })
}

/// Total fatalities across `records`.
pub fn total<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a FatalityRecord>,
{
    records.into_iter().map(|r| r.fatalities).sum()
}

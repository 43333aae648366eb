//! Fatalities bar charts.
//!
//! Renders one bar subplot per country, side by side, into an SVG file.

use crate::analysis::fatalities;
use crate::models::FatalityRecord;
use anyhow::{bail, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

const BAR_COLOR: RGBColor = RGBColor(0xd9, 0x53, 0x4f);
const GRID_COLOR: RGBColor = RGBColor(0xb0, 0xb0, 0xb0);

/// Image settings for the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl From<&crate::config::ChartConfig> for ChartOptions {
    fn from(config: &crate::config::ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// Render the per-country fatalities chart to `path`.
///
/// All panels share the x axis, spanning the years present for the
/// selected countries. Fails when none of them has any record.
pub fn render_fatalities_chart(
    records: &[FatalityRecord],
    countries: &[String],
    options: ChartOptions,
    path: &Path,
) -> Result<()> {
    let selected: Vec<Vec<&FatalityRecord>> = countries
        .iter()
        .map(|c| fatalities::for_country(records, c))
        .collect();

    let span = match fatalities::year_span(selected.iter().flatten().copied()) {
        Some(span) => span,
        None => bail!("No fatalities records for {}", countries.join(", ")),
    };

    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let panels = root.split_evenly((1, countries.len().max(1)));

    for (i, ((country, rows), panel)) in countries
        .iter()
        .zip(selected.iter())
        .zip(panels.iter())
        .enumerate()
    {
        if rows.is_empty() {
            warn!("No fatalities records for {}", country);
        }
        draw_panel(panel, country, rows, span, i == 0)?;
    }

    root.present().map_err(chart_error)?;
    debug!("Chart written to {}", path.display());

    Ok(())
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    country: &str,
    rows: &[&FatalityRecord],
    (first_year, last_year): (i32, i32),
    show_y_desc: bool,
) -> Result<()> {
    let y_max = rows.iter().map(|r| r.fatalities).fold(0.0, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let title = format!(
        "Civilian Fatalities in {} ({}–{})",
        country, first_year, last_year
    );

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(12)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d((first_year..last_year + 1).into_segmented(), 0f64..y_top)
        .map_err(chart_error)?;

    let year_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::Exact(y) | SegmentValue::CenterOf(y) => y.to_string(),
        SegmentValue::Last => String::new(),
    };
    let count_label = |v: &f64| format!("{:.0}", v);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(WHITE)
        .bold_line_style(GRID_COLOR.mix(0.5))
        .x_desc("Year")
        .x_label_formatter(&year_label)
        .y_label_formatter(&count_label);
    if show_y_desc {
        mesh.y_desc("Fatalities");
    }
    mesh.draw().map_err(chart_error)?;

    let data: Vec<(i32, f64)> = rows.iter().map(|r| (r.year, r.fatalities)).collect();

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.mix(0.8).filled())
                .margin(6)
                .data(data.iter().copied()),
        )
        .map_err(chart_error)?;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLACK.stroke_width(1))
                .margin(6)
                .data(data.iter().copied()),
        )
        .map_err(chart_error)?;

    Ok(())
}

fn chart_error(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("Chart rendering failed: {}", e)
}

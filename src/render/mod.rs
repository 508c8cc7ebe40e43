//! Terminal presentation of dashboard snapshots
//!
//! Renderers return strings so the CLI, the REPL and tests share them.
//! Padding is applied before colouring; ANSI escapes would otherwise count
//! towards column widths.

use crate::dashboard::{BandCount, DistrictTrend, Kpis, Snapshot};
use crate::errors::Result;
use crate::types::{RiskBand, RiskRecord};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

const CARD_WIDTH: usize = 26;
const BAR_GLYPH: &str = "█";
/// Longest stacked bar; larger weeks are scaled down to fit
const BAR_WIDTH: usize = 40;
const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Message shown in place of a chart or table with no rows
pub const NO_ROWS: &str = "No rows for current filters.";

/// Enable or disable ANSI colours process-wide
pub fn set_color(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

fn band_cell(band: RiskBand, width: usize) -> String {
    format!("{:<width$}", band.as_str(), width = width)
        .color(band.color())
        .bold()
        .to_string()
}

fn card(label: &str, value: &str, highlight: Option<colored::Color>) -> [String; 4] {
    let inner = CARD_WIDTH - 2;
    let value_cell = format!(" {:<w$}", value, w = inner - 1);
    let value_cell = match highlight {
        Some(c) => value_cell.color(c).bold().to_string(),
        None => value_cell.bold().to_string(),
    };
    [
        format!("┌{}┐", "─".repeat(inner)),
        format!("│{}│", format!(" {:<w$}", label, w = inner - 1).dimmed()),
        format!("│{}│", value_cell),
        format!("└{}┘", "─".repeat(inner)),
    ]
}

/// Four KPI cards side by side
pub fn kpi_row(kpis: &Kpis) -> String {
    let cards = [
        card("States", &kpis.states.to_string(), None),
        card("Districts", &kpis.districts.to_string(), None),
        card(
            "Median forecast (yhat)",
            &format!("{:.1}", kpis.median_yhat),
            Some(colored::Color::Yellow),
        ),
        card("Red (count)", &kpis.red_count.to_string(), Some(colored::Color::Red)),
    ];

    (0..4)
        .map(|line| {
            cards
                .iter()
                .map(|c| c[line].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Glyphs for `count` rows when the busiest week holds `max_total` rows.
/// Nonzero counts always get at least one glyph.
fn bar_run(count: usize, max_total: usize) -> usize {
    if count == 0 || max_total <= BAR_WIDTH {
        return count;
    }
    ((count * BAR_WIDTH + max_total / 2) / max_total).max(1)
}

/// One stacked bar per week coloured by band. Bars are one glyph per
/// district-week until the busiest week exceeds the bar width; the legend
/// always carries exact counts.
pub fn distribution_chart(distribution: &[BandCount]) -> String {
    if distribution.is_empty() {
        return NO_ROWS.to_string();
    }

    let mut weeks: BTreeMap<NaiveDate, [usize; 3]> = BTreeMap::new();
    for c in distribution {
        weeks.entry(c.week_start).or_default()[c.risk_band.index()] += c.count;
    }

    let max_total = weeks.values().map(|c| c.iter().sum::<usize>()).max().unwrap_or(0);

    let mut out = Vec::with_capacity(weeks.len() + 1);
    out.push(format!("{:<12} {}", "Week", "District count by risk band").bold().to_string());
    for (week, counts) in weeks {
        let bar: String = RiskBand::ORDER
            .iter()
            .map(|band| {
                BAR_GLYPH
                    .repeat(bar_run(counts[band.index()], max_total))
                    .color(band.color())
                    .to_string()
            })
            .collect();
        let legend = RiskBand::ORDER
            .iter()
            .map(|band| format!("{}:{}", &band.as_str()[..1], counts[band.index()]))
            .collect::<Vec<_>>()
            .join(" ");
        out.push(format!("{:<12} {} {}", week.to_string(), bar, legend.dimmed()));
    }
    out.join("\n")
}

/// Aligned table of rows; with a limit, a footer counts the hidden rows
pub fn risk_table(rows: &[RiskRecord], limit: Option<usize>) -> String {
    if rows.is_empty() {
        return NO_ROWS.to_string();
    }

    // `{:<w$}` pads by chars, so widths are measured in chars too
    let state_w = rows.iter().map(|r| r.state.chars().count()).max().unwrap_or(0).max(5);
    let district_w = rows
        .iter()
        .map(|r| r.district.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);
    let shown = limit.unwrap_or(rows.len()).min(rows.len());

    let mut out = Vec::with_capacity(shown + 3);
    let header = format!(
        "{:<10}  {:<sw$}  {:<dw$}  {:>9}  {}",
        "week_start",
        "state",
        "district",
        "yhat",
        "risk_band",
        sw = state_w,
        dw = district_w
    );
    out.push(header.bold().to_string());
    out.push("─".repeat(header.chars().count()));

    for r in &rows[..shown] {
        out.push(format!(
            "{:<10}  {:<sw$}  {:<dw$}  {:>9.1}  {}",
            r.week_start.to_string(),
            r.state,
            r.district,
            r.yhat,
            band_cell(r.risk_band, 5),
            sw = state_w,
            dw = district_w
        ));
    }

    if shown < rows.len() {
        out.push(format!("... {} more rows", rows.len() - shown).dimmed().to_string());
    }
    out.join("\n")
}

/// Unicode sparkline scaled between the series minimum and maximum
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (min, max) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if finite.is_empty() {
        return String::new();
    }

    let span = max - min;
    finite
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK_GLYPHS[SPARK_GLYPHS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK_GLYPHS.len() - 1) as f64).round() as usize;
                SPARK_GLYPHS[idx.min(SPARK_GLYPHS.len() - 1)]
            }
        })
        .collect()
}

/// Trend table (observed cases, then forecasts) with a sparkline
pub fn trend_view(trend: &DistrictTrend) -> String {
    let mut out = Vec::new();
    out.push(format!("District trend: {}", trend.district).bold().to_string());

    match &trend.history {
        Some(points) => out.push(
            format!("Observed: last {} weeks of actuals", points.len())
                .dimmed()
                .to_string(),
        ),
        None => out.push(
            "Tip: pass --history to show trailing actuals alongside forecasts."
                .dimmed()
                .to_string(),
        ),
    }

    let spark = sparkline(&trend.series());
    if !spark.is_empty() {
        out.push(format!("  {}", spark.cyan()));
    }

    let header = format!("{:<10}  {:>9}  {:>9}  {}", "week", "cases", "forecast", "band");
    out.push(header.bold().to_string());
    for h in trend.history.iter().flatten() {
        out.push(format!("{:<10}  {:>9.0}  {:>9}  {}", h.week_start.to_string(), h.cases, "", ""));
    }
    for f in &trend.forecast {
        out.push(format!(
            "{:<10}  {:>9}  {:>9.1}  {}",
            f.week_start.to_string(),
            "",
            f.yhat,
            band_cell(f.risk_band, 5)
        ));
    }

    if let Some(peak) = trend.peak() {
        out.push(format!(
            "Peak forecast {:.1} in week {} ({})",
            peak.yhat, peak.week_start, peak.risk_band
        ));
    }
    out.join("\n")
}

/// Full dashboard: caption, KPI row, distribution and table
pub fn dashboard(snapshot: &Snapshot, limit: Option<usize>) -> String {
    [
        snapshot.filter.to_string().dimmed().to_string(),
        kpi_row(&snapshot.kpis),
        String::new(),
        distribution_chart(&snapshot.distribution),
        String::new(),
        "Current selection".bold().to_string(),
        risk_table(&snapshot.rows, limit),
    ]
    .join("\n")
}

/// Pretty JSON for `--json` output
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

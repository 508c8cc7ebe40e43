//! KPI cards, risk-band distribution and the selection table

use crate::risk::quantile::median;
use crate::types::{RiskBand, RiskRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Row counts per band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

impl BandCounts {
    pub fn from_records(records: &[RiskRecord]) -> Self {
        let mut counts = Self::default();
        for r in records {
            *counts.get_mut(r.risk_band) += 1;
        }
        counts
    }

    pub fn get(&self, band: RiskBand) -> usize {
        match band {
            RiskBand::Green => self.green,
            RiskBand::Amber => self.amber,
            RiskBand::Red => self.red,
        }
    }

    fn get_mut(&mut self, band: RiskBand) -> &mut usize {
        match band {
            RiskBand::Green => &mut self.green,
            RiskBand::Amber => &mut self.amber,
            RiskBand::Red => &mut self.red,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.amber + self.red
    }
}

/// Headline numbers for the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub states: usize,
    pub districts: usize,
    /// Median `yhat`, one decimal; 0 for an empty selection
    pub median_yhat: f64,
    pub red_count: usize,
    pub band_counts: BandCounts,
}

impl Kpis {
    pub fn compute(view: &[RiskRecord]) -> Self {
        let states: BTreeSet<&str> = view.iter().map(|r| r.state.as_str()).collect();
        let districts: BTreeSet<&str> = view.iter().map(|r| r.district.as_str()).collect();
        let yhats: Vec<f64> = view.iter().map(|r| r.yhat).collect();
        // halves go to the even neighbour: 95.25 shows as 95.2
        let median_yhat = median(&yhats)
            .map(|m| (m * 10.0).round_ties_even() / 10.0)
            .unwrap_or(0.0);
        let band_counts = BandCounts::from_records(view);

        Self {
            states: states.len(),
            districts: districts.len(),
            median_yhat,
            red_count: band_counts.red,
            band_counts,
        }
    }
}

/// Number of rows in one band for one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub week_start: NaiveDate,
    pub risk_band: RiskBand,
    pub count: usize,
}

/// Rows per (week, band), ordered by week then Green, Amber, Red. Empty
/// combinations are omitted.
pub fn band_distribution(view: &[RiskRecord]) -> Vec<BandCount> {
    let mut counts: BTreeMap<(NaiveDate, RiskBand), usize> = BTreeMap::new();
    for r in view {
        *counts.entry((r.week_start, r.risk_band)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((week_start, risk_band), count)| BandCount {
            week_start,
            risk_band,
            count,
        })
        .collect()
}

/// Selection sorted by week, state, district
pub fn selection_table(view: &[RiskRecord]) -> Vec<RiskRecord> {
    let mut rows = view.to_vec();
    rows.sort_by(|a, b| a.table_key().cmp(&b.table_key()));
    rows
}

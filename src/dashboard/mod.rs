//! Dashboard queries over the risk table
//!
//! Everything here is a pure function of the risk rows and the current
//! [`Filter`]; rendering lives in [`crate::render`].

pub mod filter;
pub mod kpi;
pub mod trend;

pub use filter::{is_all, Filter, FilterOptions, ALL};
pub use kpi::{band_distribution, selection_table, BandCount, BandCounts, Kpis};
pub use trend::{district_choices, district_trend, DistrictTrend, DEFAULT_HISTORY_WINDOW};

use crate::types::RiskRecord;
use serde::Serialize;

/// Everything the dashboard shows for one selection
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub filter: Filter,
    pub kpis: Kpis,
    pub distribution: Vec<BandCount>,
    pub rows: Vec<RiskRecord>,
}

impl Snapshot {
    pub fn build(records: &[RiskRecord], filter: &Filter) -> Self {
        let view = filter.apply(records);
        Self {
            filter: filter.clone(),
            kpis: Kpis::compute(&view),
            distribution: band_distribution(&view),
            rows: selection_table(&view),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

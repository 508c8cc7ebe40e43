//! Per-district quantile banding

use super::quantile::quantile_sorted;
use crate::errors::{OutbreakError, Result};
use crate::types::{ForecastRecord, RiskBand, RiskRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quantile levels at which a forecast turns Amber and Red
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub amber: f64,
    pub red: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            amber: 0.75,
            red: 0.90,
        }
    }
}

impl BandThresholds {
    pub fn new(amber: f64, red: f64) -> Result<Self> {
        let thresholds = Self { amber, red };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Require `0 <= amber <= red <= 1`
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.amber) {
            return Err(OutbreakError::InvalidQuantile(self.amber));
        }
        if !(0.0..=1.0).contains(&self.red) {
            return Err(OutbreakError::InvalidQuantile(self.red));
        }
        if self.amber > self.red {
            return Err(OutbreakError::ConfigError(format!(
                "amber quantile {} must not exceed red quantile {}",
                self.amber, self.red
            )));
        }
        Ok(())
    }
}

/// Cut points of one district
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cuts {
    amber: f64,
    red: f64,
}

impl Cuts {
    fn classify(&self, yhat: f64) -> RiskBand {
        if yhat >= self.red {
            RiskBand::Red
        } else if yhat >= self.amber {
            RiskBand::Amber
        } else {
            RiskBand::Green
        }
    }
}

fn district_cuts<'a, I>(points: I, thresholds: &BandThresholds) -> HashMap<&'a str, Cuts>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut grouped: HashMap<&str, Vec<f64>> = HashMap::new();
    for (district, yhat) in points {
        grouped.entry(district).or_default().push(yhat);
    }

    grouped
        .into_iter()
        .map(|(district, mut values)| {
            values.sort_by(|a, b| a.total_cmp(b));
            let cuts = Cuts {
                amber: quantile_sorted(&values, thresholds.amber),
                red: quantile_sorted(&values, thresholds.red),
            };
            (district, cuts)
        })
        .collect()
}

/// Assign a risk band to every forecast.
///
/// Forecasts are grouped by district name and each one is banded against the
/// quantiles of its own group. Output is ordered by state, district and week.
pub fn assign_bands(forecasts: &[ForecastRecord], thresholds: &BandThresholds) -> Vec<RiskRecord> {
    let cuts = district_cuts(
        forecasts.iter().map(|f| (f.district.as_str(), f.yhat)),
        thresholds,
    );

    let mut banded: Vec<RiskRecord> = forecasts
        .iter()
        .map(|f| {
            // every district has an entry: cuts were built from the same rows
            let band = cuts
                .get(f.district.as_str())
                .map(|c| c.classify(f.yhat))
                .unwrap_or(RiskBand::Green);
            RiskRecord::from_forecast(f, band)
        })
        .collect();

    banded.sort_by(|a, b| {
        (&a.state, &a.district, a.week_start).cmp(&(&b.state, &b.district, b.week_start))
    });

    tracing::debug!(
        rows = banded.len(),
        districts = cuts.len(),
        amber = thresholds.amber,
        red = thresholds.red,
        "assigned risk bands"
    );

    banded
}

/// Rows whose supplied band differs from the band recomputed from their
/// district's forecasts. Returns `(row, recomputed_band)` pairs.
pub fn band_disagreements<'a>(
    risk: &'a [RiskRecord],
    thresholds: &BandThresholds,
) -> Vec<(&'a RiskRecord, RiskBand)> {
    let cuts = district_cuts(
        risk.iter().map(|r| (r.district.as_str(), r.yhat)),
        thresholds,
    );

    risk.iter()
        .filter_map(|r| {
            let expected = cuts.get(r.district.as_str())?.classify(r.yhat);
            (expected != r.risk_band).then_some((r, expected))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn forecast(district: &str, week: i64, yhat: f64) -> ForecastRecord {
        let first = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        ForecastRecord {
            week_start: first + chrono::Duration::weeks(week),
            state: "Karnataka".to_string(),
            district: district.to_string(),
            yhat,
        }
    }

    #[test]
    fn test_ten_week_district() {
        // yhat 10..=100: q75 = 77.5, q90 = 91.0
        let rows: Vec<_> = (0..10)
            .rev()
            .map(|w| forecast("Mysuru", w, (w + 1) as f64 * 10.0))
            .collect();
        let banded = assign_bands(&rows, &BandThresholds::default());

        let bands: Vec<RiskBand> = banded.iter().map(|r| r.risk_band).collect();
        let mut expected = vec![RiskBand::Green; 7];
        expected.extend([RiskBand::Amber, RiskBand::Amber, RiskBand::Red]);
        assert_eq!(bands, expected);
    }

    #[test]
    fn test_four_weeks_have_no_amber() {
        // with four points only the maximum clears the 75th percentile
        let rows = vec![
            forecast("Mysuru", 0, 10.0),
            forecast("Mysuru", 1, 20.0),
            forecast("Mysuru", 2, 40.0),
            forecast("Mysuru", 3, 33.0),
        ];
        let banded = assign_bands(&rows, &BandThresholds::default());
        let bands: Vec<RiskBand> = banded.iter().map(|r| r.risk_band).collect();
        assert_eq!(
            bands,
            vec![RiskBand::Green, RiskBand::Green, RiskBand::Red, RiskBand::Green]
        );
    }

    #[test]
    fn test_districts_banded_independently() {
        let rows = vec![
            forecast("Low", 0, 1.0),
            forecast("Low", 1, 2.0),
            forecast("High", 0, 100.0),
            forecast("High", 1, 200.0),
        ];
        let banded = assign_bands(&rows, &BandThresholds::default());
        let reds: Vec<&str> = banded
            .iter()
            .filter(|r| r.risk_band == RiskBand::Red)
            .map(|r| r.district.as_str())
            .collect();
        assert_eq!(reds, vec!["High", "Low"]);
    }

    #[test]
    fn test_single_row_is_red() {
        let banded = assign_bands(&[forecast("Solo", 0, 5.0)], &BandThresholds::default());
        assert_eq!(banded[0].risk_band, RiskBand::Red);
    }

    #[test]
    fn test_constant_series_is_all_red() {
        let rows: Vec<_> = (0..4).map(|w| forecast("Flat", w, 50.0)).collect();
        let banded = assign_bands(&rows, &BandThresholds::default());
        assert!(banded.iter().all(|r| r.risk_band == RiskBand::Red));
    }

    #[test]
    fn test_empty_input() {
        assert!(assign_bands(&[], &BandThresholds::default()).is_empty());
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(BandThresholds::new(0.75, 0.9).is_ok());
        assert!(BandThresholds::new(0.95, 0.9).is_err());
        assert!(BandThresholds::new(0.5, 1.2).is_err());
    }

    #[test]
    fn test_disagreements_detected() {
        let rows = vec![
            forecast("Mysuru", 0, 10.0),
            forecast("Mysuru", 1, 20.0),
            forecast("Mysuru", 2, 40.0),
        ];
        let mut banded = assign_bands(&rows, &BandThresholds::default());
        assert!(band_disagreements(&banded, &BandThresholds::default()).is_empty());

        banded[0].risk_band = RiskBand::Red;
        let diffs = band_disagreements(&banded, &BandThresholds::default());
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].1, RiskBand::Green);
    }
}

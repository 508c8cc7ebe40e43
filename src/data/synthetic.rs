//! Small synthetic dataset so the dashboard always has something to show

use crate::risk::{assign_bands, BandThresholds};
use crate::types::{ForecastRecord, RiskRecord};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Districts covered by the demo
pub const DEMO_DISTRICTS: [(&str, &str); 3] = [
    ("Karnataka", "Bengaluru Urban"),
    ("Tamil Nadu", "Chennai"),
    ("Delhi", "New Delhi"),
];

/// Number of forecast weeks per district
pub const DEMO_WEEKS: i64 = 4;

/// First forecast week (a Sunday)
pub fn first_week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 16).unwrap_or_default()
}

/// Synthetic forecasts and their risk bands
#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub seed: u64,
    pub forecasts: Vec<ForecastRecord>,
    pub risk: Vec<RiskRecord>,
}

/// Generate the demo. Each district gets a base level drawn from 60..160
/// and four weekly values of `base + 10 * N(0, 1)`, floored at zero.
pub fn generate(seed: u64, thresholds: &BandThresholds) -> SyntheticData {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = first_week();

    let mut forecasts = Vec::with_capacity(DEMO_DISTRICTS.len() * DEMO_WEEKS as usize);
    for (state, district) in DEMO_DISTRICTS {
        let base = rng.gen_range(60..160) as f64;
        for week in 0..DEMO_WEEKS {
            let noise: f64 = rng.sample(StandardNormal);
            forecasts.push(ForecastRecord {
                week_start: start + Duration::weeks(week),
                state: state.to_string(),
                district: district.to_string(),
                yhat: (base + noise * 10.0).max(0.0),
            });
        }
    }

    forecasts.sort_by(|a, b| {
        (&a.state, &a.district, a.week_start).cmp(&(&b.state, &b.district, b.week_start))
    });
    let risk = assign_bands(&forecasts, thresholds);

    tracing::info!(seed, rows = forecasts.len(), "generated synthetic demo data");

    SyntheticData {
        seed,
        forecasts,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_shape() {
        let data = generate(7, &BandThresholds::default());
        assert_eq!(data.forecasts.len(), 12);
        assert_eq!(data.risk.len(), 12);
        assert!(data.forecasts.iter().all(|f| f.yhat >= 0.0));
        assert!(data
            .forecasts
            .iter()
            .all(|f| f.week_start.weekday() == Weekday::Sun));
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = generate(42, &BandThresholds::default());
        let b = generate(42, &BandThresholds::default());
        assert_eq!(a.forecasts, b.forecasts);
        assert_eq!(a.risk, b.risk);
    }

    #[test]
    fn test_sorted_by_state_district_week() {
        let data = generate(1, &BandThresholds::default());
        let states: Vec<&str> = data.forecasts.iter().map(|f| f.state.as_str()).collect();
        assert_eq!(states[0], "Delhi");
        assert_eq!(states[11], "Tamil Nadu");
        assert!(data
            .forecasts
            .windows(2)
            .filter(|w| w[0].district == w[1].district)
            .all(|w| w[0].week_start < w[1].week_start));
    }

    #[test]
    fn test_every_district_has_a_red_week() {
        let data = generate(3, &BandThresholds::default());
        for (_, district) in DEMO_DISTRICTS {
            assert!(data
                .risk
                .iter()
                .any(|r| r.district == district && r.risk_band == crate::types::RiskBand::Red));
        }
    }
}

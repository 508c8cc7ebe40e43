//! District trend: trailing observed cases followed by the forecast

use crate::errors::{OutbreakError, Result};
use crate::types::{HistoryRecord, RiskBand, RiskRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Weeks of history shown before the forecast
pub const DEFAULT_HISTORY_WINDOW: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub week_start: NaiveDate,
    pub cases: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub week_start: NaiveDate,
    pub yhat: f64,
    pub risk_band: RiskBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictTrend {
    pub district: String,
    /// `None` when no usable history mentions the district
    pub history: Option<Vec<HistoryPoint>>,
    pub forecast: Vec<ForecastPoint>,
}

impl DistrictTrend {
    /// Observed cases then forecasts, in week order
    pub fn series(&self) -> Vec<f64> {
        let observed = self.history.iter().flatten().map(|h| h.cases);
        let forecast = self.forecast.iter().map(|f| f.yhat);
        observed.chain(forecast).collect()
    }

    /// Highest-risk forecast week, the latest one on ties
    pub fn peak(&self) -> Option<&ForecastPoint> {
        self.forecast
            .iter()
            .max_by(|a, b| a.yhat.total_cmp(&b.yhat))
    }
}

/// Sorted unique districts offered by the trend picker
pub fn district_choices(risk: &[RiskRecord]) -> Vec<String> {
    risk.iter()
        .map(|r| r.district.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Build the trend for `district`. Matching is exact first, then
/// case-insensitive.
pub fn district_trend(
    risk: &[RiskRecord],
    history: Option<&[HistoryRecord]>,
    district: &str,
    window: usize,
) -> Result<DistrictTrend> {
    let wanted = district.trim();
    let name = risk
        .iter()
        .find(|r| r.district == wanted)
        .or_else(|| risk.iter().find(|r| r.district.eq_ignore_ascii_case(wanted)))
        .map(|r| r.district.clone())
        .ok_or_else(|| OutbreakError::UnknownDistrict(wanted.to_string()))?;

    let mut forecast: Vec<ForecastPoint> = risk
        .iter()
        .filter(|r| r.district == name)
        .map(|r| ForecastPoint {
            week_start: r.week_start,
            yhat: r.yhat,
            risk_band: r.risk_band,
        })
        .collect();
    forecast.sort_by_key(|p| p.week_start);

    let history = history.and_then(|rows| {
        let mut points: Vec<HistoryPoint> = rows
            .iter()
            .filter(|h| h.district == name)
            .map(|h| HistoryPoint {
                week_start: h.week_start,
                cases: h.cases,
            })
            .collect();
        if points.is_empty() {
            return None;
        }
        points.sort_by_key(|p| p.week_start);
        let start = points.len().saturating_sub(window);
        Some(points.split_off(start))
    });

    Ok(DistrictTrend {
        district: name,
        history,
        forecast,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn week(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap() + Duration::weeks(n)
    }

    fn risk() -> Vec<RiskRecord> {
        vec![
            RiskRecord {
                week_start: week(46),
                state: "Tamil Nadu".to_string(),
                district: "Chennai".to_string(),
                yhat: 130.0,
                risk_band: RiskBand::Red,
            },
            RiskRecord {
                week_start: week(45),
                state: "Tamil Nadu".to_string(),
                district: "Chennai".to_string(),
                yhat: 110.0,
                risk_band: RiskBand::Green,
            },
        ]
    }

    fn history(n: i64) -> Vec<HistoryRecord> {
        (0..n)
            .map(|i| HistoryRecord {
                week_start: week(i),
                district: "Chennai".to_string(),
                cases: i as f64,
            })
            .collect()
    }

    #[test]
    fn test_forecast_sorted_by_week() {
        let trend = district_trend(&risk(), None, "Chennai", DEFAULT_HISTORY_WINDOW).unwrap();
        assert_eq!(trend.forecast[0].yhat, 110.0);
        assert_eq!(trend.forecast[1].yhat, 130.0);
        assert!(trend.history.is_none());
    }

    #[test]
    fn test_history_window_keeps_latest() {
        let hist = history(45);
        let trend = district_trend(&risk(), Some(&hist), "Chennai", 40).unwrap();
        let points = trend.history.unwrap();
        assert_eq!(points.len(), 40);
        assert_eq!(points[0].cases, 5.0);
        assert_eq!(points[39].cases, 44.0);
    }

    #[test]
    fn test_history_for_other_district_is_ignored() {
        let hist = vec![HistoryRecord {
            week_start: week(1),
            district: "Madurai".to_string(),
            cases: 3.0,
        }];
        let trend = district_trend(&risk(), Some(&hist), "Chennai", 40).unwrap();
        assert!(trend.history.is_none());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let trend = district_trend(&risk(), None, "chennai", 40).unwrap();
        assert_eq!(trend.district, "Chennai");
    }

    #[test]
    fn test_unknown_district() {
        let err = district_trend(&risk(), None, "Atlantis", 40).unwrap_err();
        assert!(matches!(err, OutbreakError::UnknownDistrict(_)));
    }

    #[test]
    fn test_series_and_peak() {
        let hist = history(2);
        let trend = district_trend(&risk(), Some(&hist), "Chennai", 40).unwrap();
        assert_eq!(trend.series(), vec![0.0, 1.0, 110.0, 130.0]);
        assert_eq!(trend.peak().map(|p| p.yhat), Some(130.0));
    }

    #[test]
    fn test_district_choices() {
        assert_eq!(district_choices(&risk()), vec!["Chennai"]);
    }
}

//! District-week records

use super::band::RiskBand;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast point: expected fever cases for a district in a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub week_start: NaiveDate,
    pub state: String,
    pub district: String,
    pub yhat: f64,
}

/// A forecast point with its assigned risk band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub week_start: NaiveDate,
    pub state: String,
    pub district: String,
    pub yhat: f64,
    pub risk_band: RiskBand,
}

/// Observed weekly case count for a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub week_start: NaiveDate,
    pub district: String,
    pub cases: f64,
}

impl RiskRecord {
    pub fn from_forecast(forecast: &ForecastRecord, risk_band: RiskBand) -> Self {
        Self {
            week_start: forecast.week_start,
            state: forecast.state.clone(),
            district: forecast.district.clone(),
            yhat: forecast.yhat,
            risk_band,
        }
    }

    /// Drop the band, keeping the forecast point
    pub fn to_forecast(&self) -> ForecastRecord {
        ForecastRecord {
            week_start: self.week_start,
            state: self.state.clone(),
            district: self.district.clone(),
            yhat: self.yhat,
        }
    }

    /// Sort key used by the selection table: week, then state, then district
    pub fn table_key(&self) -> (NaiveDate, &str, &str) {
        (self.week_start, &self.state, &self.district)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_round_trip_through_risk() {
        let forecast = ForecastRecord {
            week_start: NaiveDate::from_ymd_opt(2025, 11, 16).unwrap(),
            state: "Delhi".to_string(),
            district: "New Delhi".to_string(),
            yhat: 101.5,
        };
        let risk = RiskRecord::from_forecast(&forecast, RiskBand::Amber);
        assert_eq!(risk.risk_band, RiskBand::Amber);
        assert_eq!(risk.to_forecast(), forecast);
    }
}

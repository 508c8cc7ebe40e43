//! Data layer: table ingestion, the synthetic demo and CSV export
//!
//! [`Dataset::load`] resolves the inputs the user supplied into a complete
//! dataset. Missing pieces are filled in rather than rejected:
//!
//! - forecasts only: risk bands are derived with [`crate::risk::assign_bands`]
//! - risk bands only: forecasts are projected from the banded rows
//! - nothing: the synthetic demo is generated
//!
//! A history table is optional and never fatal; when it cannot be used the
//! trend view simply omits observed cases.

pub mod export;
pub mod loader;
pub mod source;
pub mod synthetic;

pub use export::{
    export_forecasts, export_risk, write_forecasts_csv, write_risk_csv, DEFAULT_EXPORT_NAME,
};
pub use loader::{load_forecasts, load_history, load_risk_bands, parse_week, LoadReport};
pub use source::{DataSource, DefaultFetcher, SourceFetcher};

use crate::errors::Result;
use crate::risk::{assign_bands, BandThresholds};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{ForecastRecord, HistoryRecord, RiskRecord};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// Sources the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetInputs {
    pub forecasts: Option<DataSource>,
    pub risk_bands: Option<DataSource>,
    pub history: Option<DataSource>,
}

/// Knobs that shape a loaded dataset
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub thresholds: BandThresholds,
    /// Seed for the synthetic demo; random when unset
    pub seed: Option<u64>,
}

/// How the dataset came to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOrigin {
    Files {
        forecasts: Option<String>,
        risk_bands: Option<String>,
        bands_derived: bool,
    },
    Synthetic {
        seed: u64,
    },
}

impl fmt::Display for DatasetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetOrigin::Synthetic { seed } => write!(f, "synthetic demo (seed {})", seed),
            DatasetOrigin::Files {
                forecasts,
                risk_bands,
                bands_derived,
            } => {
                let mut parts = Vec::new();
                if let Some(fc) = forecasts {
                    parts.push(fc.clone());
                }
                if let Some(rb) = risk_bands {
                    parts.push(rb.clone());
                }
                write!(f, "{}", parts.join(" + "))?;
                if *bands_derived {
                    write!(f, " (bands derived)")?;
                }
                Ok(())
            }
        }
    }
}

/// Forecasts, banded forecasts and optional observed history
#[derive(Debug, Clone)]
pub struct Dataset {
    forecasts: Vec<ForecastRecord>,
    risk: Vec<RiskRecord>,
    history: Option<Vec<HistoryRecord>>,
    origin: DatasetOrigin,
}

impl Dataset {
    pub fn from_parts(
        forecasts: Vec<ForecastRecord>,
        risk: Vec<RiskRecord>,
        history: Option<Vec<HistoryRecord>>,
        origin: DatasetOrigin,
    ) -> Self {
        Self {
            forecasts,
            risk,
            history,
            origin,
        }
    }

    /// Synthetic demo dataset
    pub fn synthetic(seed: u64, thresholds: &BandThresholds) -> Self {
        let data = synthetic::generate(seed, thresholds);
        Self::from_parts(
            data.forecasts,
            data.risk,
            None,
            DatasetOrigin::Synthetic { seed: data.seed },
        )
    }

    /// Resolve `inputs` into a dataset
    pub async fn load(
        inputs: &DatasetInputs,
        options: &LoadOptions,
        fetcher: &dyn SourceFetcher,
        telemetry: &TelemetryCollector,
    ) -> Result<Self> {
        let forecasts = match &inputs.forecasts {
            Some(src) => {
                Some(fetch_table(src, fetcher, telemetry, |b, t| load_forecasts(b, t)).await?)
            }
            None => None,
        };
        let risk = match &inputs.risk_bands {
            Some(src) => {
                Some(fetch_table(src, fetcher, telemetry, |b, t| load_risk_bands(b, t)).await?)
            }
            None => None,
        };

        let mut dataset = match (forecasts, risk) {
            (None, None) => {
                let seed = options.seed.unwrap_or_else(rand::random);
                tracing::warn!("no input files given; using the synthetic demo");
                let dataset = Self::synthetic(seed, &options.thresholds);
                telemetry.record(TelemetryEvent::SyntheticGenerated {
                    seed,
                    rows: dataset.risk.len(),
                    timestamp: Instant::now(),
                });
                dataset
            }
            (Some(forecasts), Some(risk)) => Self::from_parts(
                forecasts.rows,
                risk.rows,
                None,
                DatasetOrigin::Files {
                    forecasts: inputs.forecasts.as_ref().map(|s| s.to_string()),
                    risk_bands: inputs.risk_bands.as_ref().map(|s| s.to_string()),
                    bands_derived: false,
                },
            ),
            (Some(forecasts), None) => {
                let risk = assign_bands(&forecasts.rows, &options.thresholds);
                telemetry.record(TelemetryEvent::BandsComputed {
                    rows: risk.len(),
                    timestamp: Instant::now(),
                });
                Self::from_parts(
                    forecasts.rows,
                    risk,
                    None,
                    DatasetOrigin::Files {
                        forecasts: inputs.forecasts.as_ref().map(|s| s.to_string()),
                        risk_bands: None,
                        bands_derived: true,
                    },
                )
            }
            (None, Some(risk)) => {
                let forecasts = risk.rows.iter().map(RiskRecord::to_forecast).collect();
                Self::from_parts(
                    forecasts,
                    risk.rows,
                    None,
                    DatasetOrigin::Files {
                        forecasts: None,
                        risk_bands: inputs.risk_bands.as_ref().map(|s| s.to_string()),
                        bands_derived: false,
                    },
                )
            }
        };

        if let Some(src) = &inputs.history {
            dataset.history = load_optional_history(src, fetcher, telemetry).await;
        }

        tracing::info!(origin = %dataset.origin, rows = dataset.risk.len(), "dataset ready");
        Ok(dataset)
    }

    pub fn forecasts(&self) -> &[ForecastRecord] {
        &self.forecasts
    }

    pub fn risk(&self) -> &[RiskRecord] {
        &self.risk
    }

    pub fn history(&self) -> Option<&[HistoryRecord]> {
        self.history.as_deref()
    }

    pub fn origin(&self) -> &DatasetOrigin {
        &self.origin
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, DatasetOrigin::Synthetic { .. })
    }

    /// Sorted unique district names in the risk table
    pub fn districts(&self) -> Vec<String> {
        self.risk
            .iter()
            .map(|r| r.district.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

async fn fetch_table<T, F>(
    src: &DataSource,
    fetcher: &dyn SourceFetcher,
    telemetry: &TelemetryCollector,
    parse: F,
) -> Result<LoadReport<T>>
where
    F: FnOnce(&[u8], &str) -> Result<LoadReport<T>>,
{
    let started = Instant::now();
    let bytes = fetcher.fetch(src).await?;
    let label = src.label();
    let report = parse(&bytes[..], &label)?;

    if report.skipped > 0 {
        tracing::warn!(
            table = %label,
            skipped = report.skipped,
            "dropped rows without state or district"
        );
    }
    telemetry.record(TelemetryEvent::TableLoaded {
        table: label,
        rows: report.len(),
        skipped: report.skipped,
        duration_ms: started.elapsed().as_millis() as u64,
        timestamp: Instant::now(),
    });

    Ok(report)
}

async fn load_optional_history(
    src: &DataSource,
    fetcher: &dyn SourceFetcher,
    telemetry: &TelemetryCollector,
) -> Option<Vec<HistoryRecord>> {
    let ignore = |reason: String| {
        tracing::warn!(source = %src, %reason, "could not use history");
        telemetry.record(TelemetryEvent::HistoryIgnored {
            reason,
            timestamp: Instant::now(),
        });
        None
    };

    let started = Instant::now();
    let bytes = match fetcher.fetch(src).await {
        Ok(bytes) => bytes,
        Err(e) => return ignore(e.to_string()),
    };

    let label = src.label();
    match load_history(&bytes[..], &label) {
        Ok(Some(report)) => {
            telemetry.record(TelemetryEvent::TableLoaded {
                table: label,
                rows: report.len(),
                skipped: report.skipped,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Instant::now(),
            });
            Some(report.rows)
        }
        Ok(None) => ignore("no 'dengue_cases' or 'cases' column".to_string()),
        Err(e) => ignore(e.to_string()),
    }
}

//! OutbreakCast - district-week fever forecasts with risk banding
//!
//! Loads weekly per-district forecasts, bands each district-week Green,
//! Amber or Red against the district's own forecast quantiles, and serves
//! a filterable dashboard from the terminal.
//!
//! # Architecture
//!
//! - **data**: CSV ingestion from files, URLs or stdin; synthetic demo; export
//! - **risk**: quantiles and band assignment
//! - **dashboard**: filters, KPIs, band distribution, district trends
//! - **render**: terminal and JSON views
//! - **repl / doctor / cli**: the interactive and command-line surfaces

pub mod errors;
pub mod types;

pub mod data;
pub mod risk;

pub mod dashboard;
pub mod render;

pub mod cli;
pub mod doctor;
pub mod logging;
pub mod repl;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{OutbreakError, Result};
pub use types::{ForecastRecord, HistoryRecord, RiskBand, RiskRecord};

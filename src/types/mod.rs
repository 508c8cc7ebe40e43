//! Type definitions module
//!
//! Core district-week records shared by loading, banding and the dashboard.

pub mod band;
pub mod records;

// Re-export commonly used types
pub use band::RiskBand;
pub use records::{ForecastRecord, HistoryRecord, RiskRecord};

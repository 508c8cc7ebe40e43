//! Risk banding
//!
//! Bands are relative, not absolute: each district is compared against the
//! distribution of its own forecasts. A week whose `yhat` reaches the
//! district's 90th percentile is Red, the 75th percentile Amber, anything
//! below Green. The percentile levels are configurable through
//! [`BandThresholds`].

pub mod banding;
pub mod quantile;

pub use banding::{assign_bands, band_disagreements, BandThresholds};
pub use quantile::quantile;

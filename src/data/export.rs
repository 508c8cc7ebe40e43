//! CSV export of forecast and risk band rows

use super::loader::{FORECAST_COLUMNS, RISK_COLUMNS};
use crate::errors::Result;
use crate::types::{ForecastRecord, RiskRecord};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// File name offered for an export of the current selection
pub const DEFAULT_EXPORT_NAME: &str = "filtered_risk_bands.csv";

/// The header is written explicitly so an empty selection still yields a
/// readable file.
fn write_rows<W: Write, T: Serialize>(header: &[&str], rows: &[T], out: W) -> Result<usize> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// Write `week_start,state,district,yhat,risk_band` rows
pub fn write_risk_csv<W: Write>(rows: &[RiskRecord], out: W) -> Result<usize> {
    write_rows(&RISK_COLUMNS, rows, out)
}

/// Write `week_start,state,district,yhat` rows
pub fn write_forecasts_csv<W: Write>(rows: &[ForecastRecord], out: W) -> Result<usize> {
    write_rows(&FORECAST_COLUMNS, rows, out)
}

/// Write risk rows to `path`, creating parent directories
pub fn export_risk<P: AsRef<Path>>(rows: &[RiskRecord], path: P) -> Result<usize> {
    let file = create(path.as_ref())?;
    let written = write_risk_csv(rows, file)?;
    tracing::info!(path = %path.as_ref().display(), rows = written, "exported risk bands");
    Ok(written)
}

/// Write forecast rows to `path`, creating parent directories
pub fn export_forecasts<P: AsRef<Path>>(rows: &[ForecastRecord], path: P) -> Result<usize> {
    let file = create(path.as_ref())?;
    let written = write_forecasts_csv(rows, file)?;
    tracing::info!(path = %path.as_ref().display(), rows = written, "exported forecasts");
    Ok(written)
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

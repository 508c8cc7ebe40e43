//! CSV parsing for forecast, risk band and history tables
//!
//! Tables are read with headers, in any column order, with extra columns
//! ignored. Required columns are checked before any row is read so that a
//! wrong file fails with the missing column's name instead of a row error.

use crate::errors::{OutbreakError, Result};
use crate::types::{ForecastRecord, HistoryRecord, RiskBand, RiskRecord};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;

pub const FORECAST_COLUMNS: [&str; 4] = ["week_start", "state", "district", "yhat"];
pub const RISK_COLUMNS: [&str; 5] = ["week_start", "state", "district", "yhat", "risk_band"];

/// Case columns accepted in a history table, in order of preference
pub const HISTORY_CASE_COLUMNS: [&str; 2] = ["dengue_cases", "cases"];

/// Rows parsed from one table plus the number of rows dropped
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> LoadReport<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a week start. Accepts plain dates and datetimes; the time of day is
/// discarded.
pub fn parse_week(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(OutbreakError::InvalidDate(raw.to_string()))
}

/// Column positions resolved from a header row
struct Columns<'a> {
    table: &'a str,
    headers: StringRecord,
}

impl<'a> Columns<'a> {
    fn new(table: &'a str, headers: StringRecord) -> Self {
        Self { table, headers }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.find(name)
            .ok_or_else(|| OutbreakError::missing_column(self.table, name))
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

fn parse_yhat(table: &str, line: u64, raw: &str) -> Result<f64> {
    let value: f64 = raw.parse().map_err(|_| {
        OutbreakError::malformed(table, line, format!("yhat '{}' is not a number", raw))
    })?;
    if !value.is_finite() {
        return Err(OutbreakError::malformed(table, line, "yhat must be finite"));
    }
    Ok(value)
}

/// Next record, with ragged rows reported as malformed at their line
fn next_record(table: &str, result: csv::Result<StringRecord>) -> Result<StringRecord> {
    result.map_err(|e| match e.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => OutbreakError::malformed(
            table,
            pos.as_ref().map(|p| p.line()).unwrap_or(0),
            format!("expected {} fields, found {}", expected_len, len),
        ),
        _ => OutbreakError::CsvError(e),
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(false)
        .from_reader(input)
}

/// Shared part of a forecast or risk band row
struct PointRow {
    week_start: NaiveDate,
    state: String,
    district: String,
    yhat: f64,
}

/// Parse the four forecast columns; `Ok(None)` when the row has no state or
/// district and should be skipped.
fn parse_point(
    table: &str,
    record: &StringRecord,
    idx: &[usize; 4],
) -> Result<Option<PointRow>> {
    let line = line_of(record);
    let state = field(record, idx[1]);
    let district = field(record, idx[2]);
    if state.is_empty() || district.is_empty() {
        return Ok(None);
    }

    let week_start = parse_week(field(record, idx[0]))
        .map_err(|e| OutbreakError::malformed(table, line, e.to_string()))?;
    let yhat = parse_yhat(table, line, field(record, idx[3]))?;

    Ok(Some(PointRow {
        week_start,
        state: state.to_string(),
        district: district.to_string(),
        yhat,
    }))
}

/// Load a `week_start,state,district,yhat` table
pub fn load_forecasts<R: Read>(input: R, table: &str) -> Result<LoadReport<ForecastRecord>> {
    let mut rdr = reader(input);
    let cols = Columns::new(table, rdr.headers()?.clone());
    let idx = [
        cols.require(FORECAST_COLUMNS[0])?,
        cols.require(FORECAST_COLUMNS[1])?,
        cols.require(FORECAST_COLUMNS[2])?,
        cols.require(FORECAST_COLUMNS[3])?,
    ];

    let mut rows = Vec::new();
    let mut skipped = 0;
    for result in rdr.records() {
        let record = next_record(table, result)?;
        match parse_point(table, &record, &idx)? {
            Some(p) => rows.push(ForecastRecord {
                week_start: p.week_start,
                state: p.state,
                district: p.district,
                yhat: p.yhat,
            }),
            None => skipped += 1,
        }
    }

    tracing::debug!(table, rows = rows.len(), skipped, "parsed forecasts");
    Ok(LoadReport { rows, skipped })
}

/// Load a `week_start,state,district,yhat,risk_band` table
pub fn load_risk_bands<R: Read>(input: R, table: &str) -> Result<LoadReport<RiskRecord>> {
    let mut rdr = reader(input);
    let cols = Columns::new(table, rdr.headers()?.clone());
    let idx = [
        cols.require(RISK_COLUMNS[0])?,
        cols.require(RISK_COLUMNS[1])?,
        cols.require(RISK_COLUMNS[2])?,
        cols.require(RISK_COLUMNS[3])?,
    ];
    let band_idx = cols.require(RISK_COLUMNS[4])?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for result in rdr.records() {
        let record = next_record(table, result)?;
        let Some(p) = parse_point(table, &record, &idx)? else {
            skipped += 1;
            continue;
        };
        let risk_band = field(&record, band_idx)
            .parse::<RiskBand>()
            .map_err(|e| OutbreakError::malformed(table, line_of(&record), e.to_string()))?;

        rows.push(RiskRecord {
            week_start: p.week_start,
            state: p.state,
            district: p.district,
            yhat: p.yhat,
            risk_band,
        });
    }

    tracing::debug!(table, rows = rows.len(), skipped, "parsed risk bands");
    Ok(LoadReport { rows, skipped })
}

/// Load a weekly history table.
///
/// The case count comes from `dengue_cases` when present, otherwise
/// `cases`. Returns `Ok(None)` when neither column exists. Rows with a blank
/// case count are skipped.
pub fn load_history<R: Read>(input: R, table: &str) -> Result<Option<LoadReport<HistoryRecord>>> {
    let mut rdr = reader(input);
    let cols = Columns::new(table, rdr.headers()?.clone());
    let week_idx = cols.require("week_start")?;
    let district_idx = cols.require("district")?;

    let Some(case_idx) = HISTORY_CASE_COLUMNS.iter().find_map(|c| cols.find(c)) else {
        tracing::warn!(table, "history has neither 'dengue_cases' nor 'cases'; ignoring it");
        return Ok(None);
    };

    let mut rows = Vec::new();
    let mut skipped = 0;
    for result in rdr.records() {
        let record = next_record(table, result)?;
        let line = line_of(&record);
        let district = field(&record, district_idx);
        let raw_cases = field(&record, case_idx);
        if district.is_empty() || raw_cases.is_empty() {
            skipped += 1;
            continue;
        }

        let week_start = parse_week(field(&record, week_idx))
            .map_err(|e| OutbreakError::malformed(table, line, e.to_string()))?;
        let cases: f64 = raw_cases.parse().map_err(|_| {
            let message = format!("case count '{}' is not a number", raw_cases);
            OutbreakError::malformed(table, line, message)
        })?;
        if !cases.is_finite() {
            return Err(OutbreakError::malformed(table, line, "case count must be finite"));
        }

        rows.push(HistoryRecord {
            week_start,
            district: district.to_string(),
            cases,
        });
    }

    tracing::debug!(table, rows = rows.len(), skipped, "parsed history");
    Ok(Some(LoadReport { rows, skipped }))
}

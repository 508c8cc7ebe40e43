//! Error types for OutbreakCast
//!
//! Every fallible library operation returns [`Result`]; the binary wraps
//! these in `anyhow` with added context at the command boundary.

use thiserror::Error;

/// Main error type for loading, banding and querying forecast data
#[derive(Error, Debug)]
pub enum OutbreakError {
    /// A CSV input lacks a column the table requires
    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A row could not be parsed
    #[error("{table}: line {line}: {message}")]
    MalformedRow {
        table: String,
        line: u64,
        message: String,
    },

    /// Risk band label outside Green/Amber/Red
    #[error("Invalid risk band '{0}' (expected Green, Amber or Red)")]
    InvalidRiskBand(String),

    /// Week start that is not a recognisable date
    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    /// Quantile level outside [0, 1]
    #[error("Quantile {0} is outside [0, 1]")]
    InvalidQuantile(f64),

    /// District not present in the dataset
    #[error("Unknown district '{0}'")]
    UnknownDistrict(String),

    /// State not present in the dataset
    #[error("Unknown state '{0}'")]
    UnknownState(String),

    /// Week with no forecast rows
    #[error("No forecasts for week {0}")]
    UnknownWeek(chrono::NaiveDate),

    /// Remote source could not be fetched
    #[error("Failed to fetch {url}: {reason}")]
    FetchError { url: String, reason: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// CSV reader/writer errors
    #[error("{0}")]
    CsvError(#[from] csv::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for OutbreakCast operations
pub type Result<T> = std::result::Result<T, OutbreakError>;

/// Convert anyhow errors to OutbreakError
impl From<anyhow::Error> for OutbreakError {
    fn from(err: anyhow::Error) -> Self {
        OutbreakError::Generic(err.to_string())
    }
}

impl OutbreakError {
    pub fn malformed(table: &str, line: u64, message: impl Into<String>) -> Self {
        OutbreakError::MalformedRow {
            table: table.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn missing_column(table: &str, column: &str) -> Self {
        OutbreakError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

use crate::timeseries::{FloatValue, Year};
use thiserror::Error;

/// Error type for invalid operations.
///
/// Every variant is a deterministic input-validation failure; none of them are
/// worth retrying with the same inputs.
#[derive(Error, Debug)]
pub enum NZCalcError {
    #[error("{0}")]
    Error(String),
    #[error("Cannot convert {value:?} in column '{column}' to a number")]
    DataFormat { column: String, value: String },
    #[error("No historical data available for '{0}'")]
    DataAvailability(String),
    #[error("Row total is zero in {year}; shares are undefined for that row")]
    ZeroTotal { year: Year },
    #[error("Ambition level {0} is outside of the range [1, 4]")]
    AmbitionLevelOutOfRange(FloatValue),
    #[error("Ramp speed must be at least 1 year, got {0}")]
    InvalidRampSpeed(u32),
    #[error("Capture rate must be within (0, 100] percent, got {0}")]
    InvalidCaptureRate(FloatValue),
    #[error("Invalid transition for '{category}': {reason}")]
    InvalidTransition { category: String, reason: String },
    #[error("Key not found in factor table: {0}")]
    KeyNotFound(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Year {0} is not present in the table")]
    YearNotFound(Year),
    #[error("Invalid table: {0}")]
    InvalidTable(String),
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience type for `Result<T, NZCalcError>`.
pub type NZCalcResult<T> = Result<T, NZCalcError>;

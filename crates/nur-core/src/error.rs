//! Core error types for nur-core.
//!
//! Every component reports a structured error kind rather than a raw string,
//! so a UI can map failures to its own short messages.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nur-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schedule cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Remote timing source errors
    #[error("Timing source error: {0}")]
    TimingSource(#[from] TimingSourceError),

    /// Schedule provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Reminder delivery errors
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Schedule cache errors.
///
/// A read failure is degraded to a cache miss by the provider; these are
/// only ever fatal to callers that use the cache directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backing store cannot be opened, is locked, or failed to execute.
    #[error("schedule cache unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded back into a schedule.
    #[error("corrupt cache record: {0}")]
    Corrupt(String),
}

/// Remote timing source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingSourceError {
    /// The request could not be built (bad coordinates, bad base URL).
    #[error("invalid timing request: {0}")]
    InvalidRequest(String),

    /// Network failure, timeout, or non-success HTTP status.
    #[error("timing source unreachable: {0}")]
    Unreachable(String),

    /// The response could not be parsed into a valid schedule.
    #[error("bad timing source response: {0}")]
    BadResponse(String),
}

/// Fieldless mirror of [`TimingSourceError`] for UI mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingSourceErrorKind {
    InvalidRequest,
    Unreachable,
    BadResponse,
}

impl TimingSourceError {
    pub fn kind(&self) -> TimingSourceErrorKind {
        match self {
            TimingSourceError::InvalidRequest(_) => TimingSourceErrorKind::InvalidRequest,
            TimingSourceError::Unreachable(_) => TimingSourceErrorKind::Unreachable,
            TimingSourceError::BadResponse(_) => TimingSourceErrorKind::BadResponse,
        }
    }
}

/// Schedule provider errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The timing source failed; carried verbatim.
    #[error(transparent)]
    TimingSource(#[from] TimingSourceError),

    /// Range start is after range end.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// A range fetch was cancelled between days.
    #[error("range fetch cancelled")]
    Cancelled,
}

/// Reminder delivery boundary errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The delivery mechanism rejected or could not accept the request.
    #[error("reminder delivery unavailable: {0}")]
    DeliveryUnavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Coordinates outside [-90, 90] x [-180, 180] or not finite
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Method code outside the closed set
    #[error("Unknown calculation method code: {0}")]
    UnknownCalculationMethod(u8),

    /// Prayer name outside the five daily prayers
    #[error("Unknown prayer: {0}")]
    UnknownPrayer(String),

    /// Prayer timestamps are not strictly increasing
    #[error("Prayer times out of order on {date}: {earlier} is not before {later}")]
    NonMonotonicSchedule {
        date: chrono::NaiveDate,
        earlier: String,
        later: String,
    },

    /// UTC offset string could not be parsed
    #[error("Invalid UTC offset '{0}', expected +HH:MM or -HH:MM")]
    InvalidOffset(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnType(..) => CacheError::Corrupt(err.to_string()),
            _ => CacheError::Unavailable(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

//! Validation error types

use thiserror::Error;

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reading validation errors
///
/// Produced by [`crate::validation::validate`]; the checks short-circuit in
/// the order the variants are listed, so a payload with several problems
/// reports the first one only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required field absent from the payload
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but carries the wrong JSON type
    #[error("Field '{field}' has wrong type: expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    /// device_id is present but empty
    #[error("Invalid device_id: must be a non-empty string")]
    InvalidDeviceId,

    /// Timestamp falls outside the accepted clock-skew window
    #[error("Timestamp {timestamp} outside accepted window [{min}, {max}]")]
    TimestampOutOfRange { timestamp: i64, min: i64, max: i64 },

    /// Temperature is non-finite or outside the physical sanity bounds
    #[error("Temperature {0}°C outside sanity range [-50, 60]")]
    TemperatureOutOfSanityRange(f64),

    /// Optional percentage field outside [0, 100]
    #[error("Field '{field}' value {value} outside [0, 100]")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    /// Optional GPS coordinate outside its valid range
    #[error("Field '{field}' value {value} outside valid coordinate range")]
    CoordinateOutOfRange { field: &'static str, value: f64 },
}

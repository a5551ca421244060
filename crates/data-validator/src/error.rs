//! Validation Error Types

use thiserror::Error;

/// Errors during ingestion validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Missing or blank required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field is not a number
    #[error("{field} value '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    /// Field parsed but is NaN or infinite
    #[error("{field} value '{value}' is not finite")]
    NotFinite { field: &'static str, value: String },

    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Timestamp in none of the accepted formats
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field)
            | Self::InvalidNumber { field, .. }
            | Self::NotFinite { field, .. }
            | Self::OutOfRange { field, .. } => field,
            Self::InvalidTimestamp(_) => "timestamp",
        }
    }
}

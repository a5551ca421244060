//! Ingestion Validation
//!
//! Turns loosely-typed submitted readings into validated, normalized ones.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{
    normalize_timestamp, parse_measurement, RawReading, ValidatedReading, ValidationConfig,
    Validator,
};

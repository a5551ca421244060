//! Reading Validator

use crate::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use storage::{Timestamp, CANONICAL_FORMAT, DISPLAY_FORMAT};
use tracing::debug;

/// Accepted input timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 4] = [
    CANONICAL_FORMAT,
    // HTML datetime-local, with and without seconds
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    DISPLAY_FORMAT,
];

/// Loosely-typed reading as submitted by a form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReading {
    pub height: Option<String>,
    pub flow: Option<String>,
    pub timestamp: Option<String>,
}

/// Reading that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedReading {
    pub height: f64,
    pub flow: f64,
    pub timestamp: Timestamp,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Plausible water height (m); unchecked when `None`
    pub height_range: Option<(f64, f64)>,
    /// Plausible flow rate (m³/s); unchecked when `None`
    pub flow_range: Option<(f64, f64)>,
}

/// Validator for submitted readings
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate all three fields, reporting the first failure
    pub fn validate(&self, raw: &RawReading) -> Result<ValidatedReading, ValidationError> {
        let height = present("height", raw.height.as_deref())?;
        let flow = present("flow", raw.flow.as_deref())?;
        let timestamp = present("timestamp", raw.timestamp.as_deref())?;

        let height = self.validate_height(parse_measurement("height", height)?)?;
        let flow = self.validate_flow(parse_measurement("flow", flow)?)?;
        let timestamp = normalize_timestamp(timestamp)?;

        debug!(height, flow, %timestamp, "Reading validated");
        Ok(ValidatedReading {
            height,
            flow,
            timestamp,
        })
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn validate_height(&self, height: f64) -> Result<f64, ValidationError> {
        if let Some(range) = self.config.height_range {
            self.validate_range("height", height, range)?;
        }
        Ok(height)
    }

    fn validate_flow(&self, flow: f64) -> Result<f64, ValidationError> {
        if let Some(range) = self.config.flow_range {
            self.validate_range("flow", flow, range)?;
        }
        Ok(flow)
    }
}

/// Blank values count as missing
fn present<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Parse a finite floating-point measurement
pub fn parse_measurement(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let value = value.trim();
    let parsed = value.parse::<f64>().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: value.to_string(),
    })?;

    if !parsed.is_finite() {
        return Err(ValidationError::NotFinite {
            field,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

/// Normalize any accepted timestamp layout to the canonical one
pub fn normalize_timestamp(value: &str) -> Result<Timestamp, ValidationError> {
    let value = value.trim();
    let datetime = TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| ValidationError::InvalidTimestamp(value.to_string()))?;

    Timestamp::new(datetime).map_err(|e| ValidationError::InvalidTimestamp(e.to_string()))
}

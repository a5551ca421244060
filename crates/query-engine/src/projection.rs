//! Field Projection

use serde::Serialize;
use storage::Reading;

use crate::FormatError;

/// Measurement selected by the `type` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Height,
    Flow,
}

impl Field {
    /// `height` selects height; anything else selects flow
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("height") => Self::Height,
            _ => Self::Flow,
        }
    }
}

/// Reading reduced to its id, display timestamp and one measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectedReading {
    Height {
        id: i64,
        timestamp: String,
        height: f64,
    },
    Flow {
        id: i64,
        timestamp: String,
        flow: f64,
    },
}

impl ProjectedReading {
    pub fn id(&self) -> i64 {
        match self {
            Self::Height { id, .. } | Self::Flow { id, .. } => *id,
        }
    }
}

/// Project readings, reformatting timestamps for display
pub fn project(readings: &[Reading], field: Field) -> Result<Vec<ProjectedReading>, FormatError> {
    readings
        .iter()
        .map(|reading| {
            let timestamp = reading
                .parsed_timestamp()
                .map_err(|_| FormatError::CorruptTimestamp {
                    id: reading.id,
                    timestamp: reading.timestamp.clone(),
                })?
                .display();

            Ok(match field {
                Field::Height => ProjectedReading::Height {
                    id: reading.id,
                    timestamp,
                    height: reading.height,
                },
                Field::Flow => ProjectedReading::Flow {
                    id: reading.id,
                    timestamp,
                    flow: reading.flow,
                },
            })
        })
        .collect()
}

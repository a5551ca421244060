//! Canonical and Display Timestamps
//!
//! Readings are stored with a fixed-width `YYYY-MM-DD HH:MM:SS` string so that
//! lexicographic order equals chronological order. The day-first display form
//! is produced on read only.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::StorageError;

/// Storage format, zero-padded and sortable
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Presentation format
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
/// Date part of the canonical format
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";
/// Date part of the display format
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
/// Time part of both formats
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Second-precision reading timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wrap a date-time, dropping sub-second precision.
    ///
    /// Years outside `0..=9999` would widen the canonical string and break
    /// its sort order, so they are rejected.
    pub fn new(datetime: NaiveDateTime) -> Result<Self, StorageError> {
        let year = datetime.year();
        if !(0..=9999).contains(&year) {
            return Err(StorageError::TimestampError(format!(
                "year {} outside 0..=9999",
                year
            )));
        }
        // with_nanosecond(0) only fails for values >= 2e9
        let truncated = datetime.with_nanosecond(0).unwrap_or(datetime);
        Ok(Self(truncated))
    }

    /// Current local time
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Parse `YYYY-MM-DD HH:MM:SS`
    pub fn parse_canonical(s: &str) -> Result<Self, StorageError> {
        let datetime = NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).map_err(|e| {
            StorageError::TimestampError(format!("'{}' is not a canonical timestamp: {}", s, e))
        })?;
        Self::new(datetime)
    }

    /// Parse `DD/MM/YYYY HH:MM:SS`
    pub fn parse_display(s: &str) -> Result<Self, StorageError> {
        let datetime = NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT).map_err(|e| {
            StorageError::TimestampError(format!("'{}' is not a display timestamp: {}", s, e))
        })?;
        Self::new(datetime)
    }

    /// Storage representation
    pub fn canonical(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }

    /// Presentation representation
    pub fn display(&self) -> String {
        self.0.format(DISPLAY_FORMAT).to_string()
    }

    /// `DD/MM/YYYY`
    pub fn display_date(&self) -> String {
        self.0.format(DISPLAY_DATE_FORMAT).to_string()
    }

    /// `HH:MM:SS`
    pub fn display_time(&self) -> String {
        self.0.format(TIME_FORMAT).to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_canonical(&s).map_err(serde::de::Error::custom)
    }
}

/// Format a calendar date the way it is compared in SQL (`YYYY-MM-DD`)
pub fn canonical_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

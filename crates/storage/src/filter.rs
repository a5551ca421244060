//! Reading Filters
//!
//! A `ReadingFilter` is fully resolved before it reaches the repository; the
//! repository never branches on the presence of optional parameters.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::timestamp::canonical_date;
use crate::StorageError;

/// Result ordering by timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A minute of the day (`HH:MM`), independent of date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteOfDay {
    hour: u32,
    minute: u32,
}

impl MinuteOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, StorageError> {
        if hour > 23 || minute > 59 {
            return Err(StorageError::TimestampError(format!(
                "{:02}:{:02} is not a minute of the day",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Inclusive lower bound, `HH:MM:00`
    pub fn start(&self) -> String {
        format!("{:02}:{:02}:00", self.hour, self.minute)
    }

    /// Inclusive upper bound, `HH:MM:59`
    pub fn end(&self) -> String {
        format!("{:02}:{:02}:59", self.hour, self.minute)
    }
}

impl FromStr for MinuteOfDay {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::TimestampError(format!("'{}' is not HH:MM", s));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }
        let hour = hour.parse::<u32>().map_err(|_| invalid())?;
        let minute = minute.parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Which readings to select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingFilter {
    /// No restriction
    All,
    /// Readings whose date equals the given day
    Day(NaiveDate),
    /// Readings dated within `[start, end]`
    Week { start: NaiveDate, end: NaiveDate },
    /// Readings dated within the calendar month, built with [`ReadingFilter::month`]
    Month { year: i32, month: u32 },
    /// The most recent `n` readings
    Latest(u32),
    /// Readings at this minute of the day, on any date
    Minute(MinuteOfDay),
}

impl ReadingFilter {
    /// Month filter; `month` must be in `1..=12`
    pub fn month(year: i32, month: u32) -> Result<Self, StorageError> {
        month_bounds(year, month)?;
        Ok(Self::Month { year, month })
    }

    /// Order used when the caller does not override it
    pub fn default_order(&self) -> SortOrder {
        match self {
            Self::Minute(_) => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    /// Build the `SELECT` for this filter.
    ///
    /// Returns the statement and its positional string bindings. The
    /// `Latest` limit is inlined since it is an integer, never user text.
    pub(crate) fn to_sql(&self, order: SortOrder) -> Result<(String, Vec<String>), StorageError> {
        let mut sql = String::from("SELECT id, timestamp, height, flow FROM readings");
        let mut binds = Vec::new();

        match self {
            Self::All | Self::Latest(_) => {}
            Self::Day(date) => {
                sql.push_str(" WHERE DATE(timestamp) = ?");
                binds.push(canonical_date(*date));
            }
            Self::Week { start, end } => {
                sql.push_str(" WHERE DATE(timestamp) BETWEEN ? AND ?");
                binds.push(canonical_date(*start));
                binds.push(canonical_date(*end));
            }
            Self::Month { year, month } => {
                let (first, next) = month_bounds(*year, *month)?;
                sql.push_str(" WHERE DATE(timestamp) >= ? AND DATE(timestamp) < ?");
                binds.push(canonical_date(first));
                binds.push(canonical_date(next));
            }
            Self::Minute(minute) => {
                sql.push_str(" WHERE TIME(timestamp) BETWEEN ? AND ?");
                binds.push(minute.start());
                binds.push(minute.end());
            }
        }

        sql.push_str(" ORDER BY timestamp ");
        sql.push_str(order.as_sql());

        if let Self::Latest(n) = self {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        Ok((sql, binds))
    }
}

/// Half-open month range `[first day, first day of next month)`
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), StorageError> {
    let out_of_range = || {
        StorageError::TimestampError(format!("{:04}-{:02} is not a valid month", year, month))
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let (next_year, next_month) = if first.month() == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(out_of_range)?;

    Ok((first, next))
}

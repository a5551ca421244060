//! Filter Request Resolution
//!
//! Request parameters arrive as optional strings. Missing or malformed
//! parameters degrade the request to `all` instead of failing it.

use chrono::NaiveDate;
use serde::Deserialize;
use storage::{MinuteOfDay, ReadingFilter, CANONICAL_DATE_FORMAT};
use tracing::warn;

/// Rows returned by the live view when no limit is given
pub const DEFAULT_LIVE_LIMIT: u32 = 10;

/// Raw query-string parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    /// `live|minute|day|week|month|all`
    pub filter: Option<String>,
    /// `height|flow`
    #[serde(rename = "type")]
    pub field: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    /// `HH:MM`
    pub minute: Option<String>,
    pub limit: Option<String>,
}

/// Filter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Live,
    Minute,
    Day,
    Week,
    Month,
    All,
}

impl FilterKind {
    /// Absent selects `Live`; unrecognized names select `All`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("live") => Self::Live,
            Some("minute") => Self::Minute,
            Some("day") => Self::Day,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("all") => Self::All,
            Some(other) => {
                warn!(filter = other, "Unknown filter, returning all readings");
                Self::All
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Minute => "minute",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }
}

/// Builds a [`ReadingFilter`] from request parameters
#[derive(Debug, Clone, Copy)]
pub struct FilterResolver {
    live_limit: u32,
}

impl FilterResolver {
    pub fn new(live_limit: u32) -> Self {
        Self {
            live_limit: live_limit.max(1),
        }
    }

    pub fn resolve(&self, params: &FilterParams) -> ReadingFilter {
        let kind = FilterKind::parse(params.filter.as_deref());

        let resolved = match kind {
            FilterKind::All => Some(ReadingFilter::All),
            FilterKind::Live => Some(ReadingFilter::Latest(self.live_limit(params))),
            FilterKind::Day => parse_date(params.date.as_deref()).map(ReadingFilter::Day),
            FilterKind::Week => parse_date(params.start.as_deref())
                .zip(parse_date(params.end.as_deref()))
                .map(|(start, end)| ReadingFilter::Week { start, end }),
            FilterKind::Month => {
                let month = parse_number::<u32>(params.month.as_deref());
                let year = parse_number::<i32>(params.year.as_deref());
                month
                    .zip(year)
                    .and_then(|(month, year)| ReadingFilter::month(year, month).ok())
            }
            FilterKind::Minute => params
                .minute
                .as_deref()
                .and_then(|m| m.parse::<MinuteOfDay>().ok())
                .map(ReadingFilter::Minute),
        };

        resolved.unwrap_or_else(|| {
            warn!(
                filter = kind.as_str(),
                "Missing or malformed filter parameters, returning all readings"
            );
            ReadingFilter::All
        })
    }

    fn live_limit(&self, params: &FilterParams) -> u32 {
        parse_number::<u32>(params.limit.as_deref())
            .filter(|n| *n > 0)
            .unwrap_or(self.live_limit)
    }
}

impl Default for FilterResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_LIMIT)
    }
}

/// Parse `YYYY-MM-DD`
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v.trim(), CANONICAL_DATE_FORMAT).ok())
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse::<T>().ok())
}

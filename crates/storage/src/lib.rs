//! Storage Layer
//!
//! Provides SQLite persistence for the append-only `readings` table with
//! insert-with-dedup and filtered queries.

mod filter;
mod repository;
mod timestamp;

pub use filter::{month_bounds, MinuteOfDay, ReadingFilter, SortOrder};
pub use repository::{InsertOutcome, Reading, Repository};
pub use timestamp::{
    canonical_date, Timestamp, CANONICAL_DATE_FORMAT, CANONICAL_FORMAT, DISPLAY_FORMAT,
};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timestamp error: {0}")]
    TimestampError(String),
}

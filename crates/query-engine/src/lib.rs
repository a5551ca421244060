//! Readings Query Engine
//!
//! Resolves loosely-typed request parameters into storage filters, projects
//! result sets to the requested field and serializes daily exports as CSV.

mod engine;
mod export;
mod projection;
mod request;

pub use engine::{CsvExport, QueryEngine};
pub use export::{export_filename, readings_to_csv, CSV_HEADER};
pub use projection::{project, Field, ProjectedReading};
pub use request::{FilterKind, FilterParams, FilterResolver, DEFAULT_LIVE_LIMIT};

use storage::StorageError;
use thiserror::Error;

/// Errors while presenting stored readings
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Reading {id} has corrupt timestamp '{timestamp}'")]
    CorruptTimestamp { id: i64, timestamp: String },
}

/// Errors from the query engine
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

//! Query Engine Implementation

use storage::{ReadingFilter, Repository};
use tracing::{debug, info, instrument};

use crate::export::{export_filename, readings_to_csv};
use crate::projection::{project, Field, ProjectedReading};
use crate::request::{parse_date, FilterParams, FilterResolver};
use crate::QueryError;

/// A rendered day export
#[derive(Debug, Clone)]
pub struct CsvExport {
    /// `data_YYYY-MM-DD.csv`
    pub filename: String,
    pub body: String,
    /// Data rows, header excluded
    pub rows: usize,
}

/// Entry point for reading queries and exports
#[derive(Debug, Clone)]
pub struct QueryEngine {
    repository: Repository,
    resolver: FilterResolver,
}

impl QueryEngine {
    /// Create a new query engine
    pub fn new(repository: Repository, live_limit: u32) -> Self {
        Self {
            repository,
            resolver: FilterResolver::new(live_limit),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Filter, then project to the requested field
    #[instrument(skip(self))]
    pub async fn readings(&self, params: &FilterParams) -> Result<Vec<ProjectedReading>, QueryError> {
        let filter = self.resolver.resolve(params);
        let field = Field::parse(params.field.as_deref());
        debug!(?filter, ?field, "Resolved reading query");

        let readings = self.repository.query(&filter).await?;
        let projected = project(&readings, field)?;

        info!(count = projected.len(), "Readings returned");
        Ok(projected)
    }

    /// CSV export of one day; `date` must be `YYYY-MM-DD`
    #[instrument(skip(self))]
    pub async fn export_day(&self, date: &str) -> Result<CsvExport, QueryError> {
        let day = parse_date(Some(date)).ok_or_else(|| QueryError::InvalidDate(date.to_string()))?;

        let readings = self.repository.query(&ReadingFilter::Day(day)).await?;
        let body = readings_to_csv(&readings)?;

        info!(%day, rows = readings.len(), "Day exported");
        Ok(CsvExport {
            filename: export_filename(day),
            body,
            rows: readings.len(),
        })
    }
}

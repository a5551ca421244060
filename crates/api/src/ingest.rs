//! Ingestion Adapter
//!
//! Validates submitted readings and hands them to storage. The caller decides
//! how outcomes map to HTTP.

use data_validator::{RawReading, ValidationConfig, ValidationError, Validator};
use storage::{InsertOutcome, Repository, StorageError};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Ingestion failures
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct IngestionAdapter {
    validator: Validator,
    repository: Repository,
}

impl IngestionAdapter {
    pub fn new(repository: Repository, config: ValidationConfig) -> Self {
        Self {
            validator: Validator::new(config),
            repository,
        }
    }

    /// Validate then insert; nothing is written when validation fails
    #[instrument(skip(self))]
    pub async fn ingest(&self, raw: &RawReading) -> Result<InsertOutcome, IngestError> {
        let reading = self.validator.validate(raw).inspect_err(|e| {
            metrics::counter!("ingest_rejected_total", "field" => e.field()).increment(1);
        })?;

        let outcome = self
            .repository
            .insert(reading.height, reading.flow, Some(reading.timestamp))
            .await?;

        match outcome {
            InsertOutcome::Inserted { id } => {
                info!(id, timestamp = %reading.timestamp, "Reading received");
                metrics::counter!("readings_inserted_total", "source" => "form").increment(1);
            }
            InsertOutcome::Duplicate => {
                debug!(timestamp = %reading.timestamp, "Reading already stored");
                metrics::counter!("readings_duplicate_total", "source" => "form").increment(1);
            }
        }
        Ok(outcome)
    }
}

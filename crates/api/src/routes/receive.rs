//! Ingestion Routes

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use data_validator::RawReading;
use std::sync::Arc;
use storage::InsertOutcome;
use tracing::instrument;

use crate::{error::ApiError, AppState};

/// POST /receive - form-encoded `height`, `flow`, `timestamp`
#[instrument(skip(state, form))]
pub async fn receive(
    State(state): State<Arc<AppState>>,
    form: Result<Form<RawReading>, FormRejection>,
) -> Result<Json<InsertOutcome>, ApiError> {
    let Form(raw) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state.ingestor.ingest(&raw).await?;
    Ok(Json(outcome))
}

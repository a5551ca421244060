//! Reading Query Routes

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use query_engine::{FilterParams, ProjectedReading};
use std::sync::Arc;
use tracing::instrument;

use crate::{error::ApiError, AppState};

/// GET /api/readings - filtered readings projected to one field
#[instrument(skip(state))]
pub async fn get_readings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<ProjectedReading>>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    metrics::counter!("queries_total").increment(1);

    let readings = state.engine.readings(&params).await?;
    Ok(Json(readings))
}

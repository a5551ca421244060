//! CSV Export Routes

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use crate::{error::ApiError, AppState};

/// Query parameters for the download endpoint
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Day to export, `YYYY-MM-DD`
    pub date: Option<String>,
}

/// GET /download - one day of readings as a CSV attachment
#[instrument(skip(state))]
pub async fn download(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: date".to_string()))?;

    let export = state.engine.export_day(date).await?;
    metrics::counter!("exports_total").increment(1);

    let disposition = format!("attachment; filename={}", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

//! `GET /logs`: newest-first fetch outcomes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use bounce_core::FetchOutcome;

use crate::state::AppState;

use super::ApiError;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: Vec<FetchOutcome>,
}

pub async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let logs = state.store.recent_outcomes(limit).await?;
    Ok(Json(LogsResponse { logs }))
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use bounce_ingest::{RunReport, TriggerKind};

use crate::state::AppState;

/// `GET|POST /refresh`: run the pipeline now and return its report.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<RunReport> {
    Json(state.orchestrator.run(TriggerKind::Manual).await)
}

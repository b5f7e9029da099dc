use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ScheduledJob {
    pub id: &'static str,
    pub next_run: Option<DateTime<Utc>>,
    pub trigger: String,
}

#[derive(Serialize)]
pub struct ScheduleInfo {
    pub scheduled_jobs: Vec<ScheduledJob>,
}

/// `GET /schedule-info`. Empty when the scheduler is disabled.
pub async fn schedule_info(State(state): State<Arc<AppState>>) -> Json<ScheduleInfo> {
    let scheduled_jobs = state
        .daily_job
        .iter()
        .map(|job| ScheduledJob {
            id: job.id(),
            next_run: job.next_run(),
            trigger: job.trigger(),
        })
        .collect();
    Json(ScheduleInfo { scheduled_jobs })
}

//! `GET /bounced-emails`: the current snapshot, or the no-data sentinel.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use bounce_core::BounceRecord;
use bounce_storage::SnapshotView;

use crate::state::AppState;

use super::ApiError;

const NO_DATA_MESSAGE: &str = "No data available yet. Run /refresh to fetch data.";

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotResponse {
    Success {
        data: Vec<BounceRecord>,
        fetched_at: DateTime<Utc>,
        total_bounced: usize,
        total_campaigns: usize,
    },
    NoData {
        message: &'static str,
    },
}

pub async fn bounced_emails(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotResponse>, ApiError> {
    let response = match state.store.current().await? {
        SnapshotView::Ready(snapshot) => SnapshotResponse::Success {
            total_bounced: snapshot.records_count(),
            total_campaigns: snapshot.campaigns_count,
            fetched_at: snapshot.created_at,
            data: snapshot.records,
        },
        SnapshotView::Empty => SnapshotResponse::NoData { message: NO_DATA_MESSAGE },
    };
    Ok(Json(response))
}

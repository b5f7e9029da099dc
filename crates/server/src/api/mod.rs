//! HTTP endpoint modules.
//!
//! Each sub-module owns one route family. Shared error type lives here.

mod health;
mod logs;
mod refresh;
mod schedule;
mod snapshot;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use bounce_storage::StorageError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Store failures surface as 500 `{error}`.
pub struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: self.0.to_string() }),
        )
            .into_response()
    }
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths used by router registration.

pub use health::health;
pub use logs::logs;
pub use refresh::refresh;
pub use schedule::schedule_info;
pub use snapshot::bounced_emails;

//! HTTP router construction.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::health))
        .route("/health", get(api::health))
        .route("/bounced-emails", get(api::bounced_emails))
        .route("/refresh", get(api::refresh).post(api::refresh))
        .route("/logs", get(api::logs))
        .route("/schedule-info", get(api::schedule_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

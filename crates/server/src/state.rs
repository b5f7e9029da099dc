use std::sync::Arc;

use bounce_ingest::IngestionOrchestrator;
use bounce_storage::SnapshotStore;

use crate::scheduler::DailyJob;

/// Shared state handed to every handler.
pub struct AppState {
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub store: SnapshotStore,
    /// `None` when the scheduler is disabled.
    pub daily_job: Option<DailyJob>,
}

//! Server startup: shared state initialization and background task spawning.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use bounce_core::Config;
use bounce_ingest::{IngestSettings, IngestionOrchestrator, SmartleadClient};
use bounce_storage::SnapshotStore;

use crate::scheduler::{DailyJob, SchedulerHandle};
use crate::state::AppState;

/// Open the store, build the provider client and orchestrator, parse the schedule.
///
/// A missing API key is not fatal here: the server still serves the last
/// snapshot, and every run reports the configuration error.
pub async fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = SnapshotStore::open(&config.storage.database_path)
        .await
        .with_context(|| format!("opening {}", config.storage.database_path.display()))?;

    if !config.provider.is_configured() {
        warn!("SMARTLEAD_API_KEY is not configured, ingestion runs will fail until it is set");
    }
    let client = SmartleadClient::new(config.provider.clone())?;
    info!(base_url = client.base_url(), "provider client ready");

    let settings = IngestSettings::from(&config.ingest);
    let orchestrator = Arc::new(IngestionOrchestrator::new(Arc::new(client), store.clone(), settings));

    let daily_job = if config.ingest.scheduler_enabled {
        let job = DailyJob::new(&config.ingest.cron)
            .with_context(|| format!("invalid FETCH_CRON '{}'", config.ingest.cron))?;
        Some(job)
    } else {
        info!("scheduler disabled");
        None
    };

    Ok(Arc::new(AppState {
        orchestrator,
        store,
        daily_job,
    }))
}

/// Spawn the daily job, if one is configured.
pub fn start_scheduler(state: &AppState) -> Option<SchedulerHandle> {
    state
        .daily_job
        .clone()
        .map(|job| SchedulerHandle::spawn(job, state.orchestrator.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_state_with_file_store_and_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_profile("");
        config.storage.database_path = dir.path().join("bounces.db");
        config.ingest.cron = "0 3 * * *".to_string();
        config.ingest.scheduler_enabled = true;

        let state = build_app_state(&config).await.unwrap();

        assert!(dir.path().join("bounces.db").exists());
        assert!(state.daily_job.is_some());
        assert!(!state.orchestrator.is_running());
        state.store.close().await;
    }

    #[tokio::test]
    async fn invalid_cron_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_profile("");
        config.storage.database_path = dir.path().join("bounces.db");
        config.ingest.cron = "every day".to_string();
        config.ingest.scheduler_enabled = true;

        let err = build_app_state(&config).await.err().unwrap();
        assert!(err.to_string().contains("FETCH_CRON"));
    }

    #[tokio::test]
    async fn disabled_scheduler_has_no_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_profile("");
        config.storage.database_path = dir.path().join("bounces.db");
        config.ingest.scheduler_enabled = false;

        let state = build_app_state(&config).await.unwrap();
        assert!(state.daily_job.is_none());
        assert!(start_scheduler(&state).is_none());
    }
}

//! In-process doubles shared by the router and scheduler tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use bounce_core::Campaign;
use bounce_ingest::{BounceSource, IngestError, IngestSettings, IngestionOrchestrator, PageRequest};
use bounce_storage::SnapshotStore;

use crate::scheduler::DailyJob;
use crate::state::AppState;

/// Fixed campaigns, each answering one page of `bounces_per_campaign` recent bounces.
pub struct StubSource {
    campaigns: Vec<Campaign>,
    bounces_per_campaign: usize,
    credential_missing: bool,
}

impl StubSource {
    pub fn empty() -> Self {
        Self::with_campaigns(Vec::new(), 0)
    }

    pub fn with_campaigns(campaigns: Vec<Campaign>, bounces_per_campaign: usize) -> Self {
        Self {
            campaigns,
            bounces_per_campaign,
            credential_missing: false,
        }
    }

    pub fn without_credentials() -> Self {
        Self {
            credential_missing: true,
            ..Self::empty()
        }
    }
}

#[async_trait]
impl BounceSource for StubSource {
    fn check_credentials(&self) -> Result<(), IngestError> {
        if self.credential_missing {
            return Err(bounce_core::ConfigError::MissingCredential.into());
        }
        Ok(())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, IngestError> {
        Ok(self.campaigns.clone())
    }

    async fn bounce_page(&self, request: &PageRequest) -> Result<Value, IngestError> {
        if request.offset > 0 {
            return Ok(json!([]));
        }
        let sent = (Utc::now() - Duration::hours(6)).to_rfc3339();
        let entries: Vec<Value> = (0..self.bounces_per_campaign)
            .map(|i| {
                json!({
                    "lead_email": format!("lead{}-{}@example.com", request.campaign_id, i),
                    "from_email": "sales@example.org",
                    "email_subject": "Hi",
                    "sent_time": sent,
                })
            })
            .collect();
        Ok(json!(entries))
    }

    fn source_name(&self) -> &str {
        "stub"
    }
}

/// Fresh state over an in-memory store.
pub async fn test_state(source: StubSource, daily_job: Option<DailyJob>) -> Arc<AppState> {
    let store = SnapshotStore::in_memory().await.unwrap();
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        Arc::new(source),
        store.clone(),
        IngestSettings::default(),
    ));
    Arc::new(AppState {
        orchestrator,
        store,
        daily_job,
    })
}

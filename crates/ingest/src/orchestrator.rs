//! Ingestion Orchestrator: one full run from campaign list to stored snapshot.
//!
//! [`IngestionOrchestrator::run`] is the single entry point for both the
//! scheduler and the manual refresh endpoint. It never returns an error:
//! every ending is a [`RunReport`], and every ending except `skipped` leaves
//! a [`FetchOutcome`] in the audit log.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use bounce_core::config::IngestConfig;
use bounce_core::{FetchOutcome, Snapshot};
use bounce_storage::SnapshotStore;

use crate::enumerator::enumerate_campaigns;
use crate::error::IngestError;
use crate::paginator::{CampaignHarvest, CampaignPaginator};
use crate::recency::RecencyWindow;
use crate::source::BounceSource;

// ── Trigger & settings ──────────────────────────────────────────────

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Manual => f.write_str("manual"),
            TriggerKind::Scheduled => f.write_str("scheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    pub window: RecencyWindow,
    pub page_size: u32,
    /// Campaigns paginated at once. Pages within a campaign stay sequential.
    pub campaign_concurrency: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            window: RecencyWindow::default(),
            page_size: 100,
            campaign_concurrency: 1,
        }
    }
}

impl From<&IngestConfig> for IngestSettings {
    fn from(cfg: &IngestConfig) -> Self {
        Self {
            window: RecencyWindow::new(cfg.window_days),
            page_size: cfg.page_size.max(1),
            campaign_concurrency: cfg.campaign_concurrency.max(1),
        }
    }
}

// ── Run report ──────────────────────────────────────────────────────

/// Structured result handed back to every caller of [`IngestionOrchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    Success {
        run_id: Uuid,
        total_campaigns: usize,
        total_bounced_emails: usize,
        aborted_campaigns: usize,
        date_range: String,
    },
    Error {
        run_id: Uuid,
        message: String,
    },
    /// Another run held the lock; nothing was fetched or recorded.
    Skipped {
        message: String,
    },
}

impl RunReport {
    pub fn is_error(&self) -> bool {
        matches!(self, RunReport::Error { .. })
    }
}

/// Totals of a committed run.
struct RunSummary {
    total_campaigns: usize,
    total_bounced_emails: usize,
    aborted_campaigns: usize,
    date_range: String,
}

impl RunSummary {
    fn outcome_detail(&self) -> String {
        format!(
            "Successfully fetched {} bounced emails from {} campaigns \
             (total_campaigns={}, total_bounced_emails={}, aborted_campaigns={})",
            self.total_bounced_emails,
            self.total_campaigns,
            self.total_campaigns,
            self.total_bounced_emails,
            self.aborted_campaigns,
        )
    }
}

// ── Orchestrator ────────────────────────────────────────────────────

pub struct IngestionOrchestrator {
    source: Arc<dyn BounceSource>,
    store: SnapshotStore,
    settings: IngestSettings,
    run_lock: Mutex<()>,
    running: AtomicBool,
}

/// Clears the running flag when the run finishes or its future is dropped.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IngestionOrchestrator {
    pub fn new(source: Arc<dyn BounceSource>, store: SnapshotStore, settings: IngestSettings) -> Self {
        Self {
            source,
            store,
            settings,
            run_lock: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the pipeline once. Overlapping calls return [`RunReport::Skipped`].
    pub async fn run(&self, trigger: TriggerKind) -> RunReport {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!(trigger = %trigger, "ingestion run already in progress, skipping");
            return RunReport::Skipped {
                message: "An ingestion run is already in progress".to_string(),
            };
        };
        let _running = RunningFlag::raise(&self.running);

        let run_id = Uuid::new_v4();
        let start = Instant::now();
        info!(
            run_id = %run_id,
            trigger = %trigger,
            source = self.source.source_name(),
            "ingestion run started"
        );

        match self.execute().await {
            Ok(summary) => {
                info!(
                    run_id = %run_id,
                    trigger = %trigger,
                    campaigns = summary.total_campaigns,
                    bounced = summary.total_bounced_emails,
                    aborted = summary.aborted_campaigns,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "ingestion run completed"
                );
                RunReport::Success {
                    run_id,
                    total_campaigns: summary.total_campaigns,
                    total_bounced_emails: summary.total_bounced_emails,
                    aborted_campaigns: summary.aborted_campaigns,
                    date_range: summary.date_range,
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    run_id = %run_id,
                    trigger = %trigger,
                    error = %message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "ingestion run failed"
                );
                if let Err(log_err) = self.store.append_outcome(&FetchOutcome::error(&message)).await {
                    error!(run_id = %run_id, error = %log_err, "failed to record error outcome");
                }
                RunReport::Error { run_id, message }
            }
        }
    }

    async fn execute(&self) -> Result<RunSummary, IngestError> {
        let cutoff = self.settings.window.cutoff(Utc::now());
        let campaigns = enumerate_campaigns(self.source.as_ref()).await?;

        let paginator = CampaignPaginator::new(self.source.as_ref(), self.settings.page_size, cutoff);
        let paginator = &paginator;
        let harvests: Vec<CampaignHarvest> = stream::iter(campaigns.clone())
            .map(move |campaign| async move { paginator.harvest(&campaign).await })
            .buffered(self.settings.campaign_concurrency.max(1))
            .collect()
            .await;

        let aborted_campaigns = harvests.iter().filter(|h| h.is_aborted()).count();
        let records: Vec<_> = harvests.into_iter().flat_map(|h| h.records).collect();

        let snapshot = Snapshot::new(records, campaigns.len());

        let summary = RunSummary {
            total_campaigns: campaigns.len(),
            total_bounced_emails: snapshot.records_count(),
            aborted_campaigns,
            date_range: format!(
                "Last {} days (since {})",
                self.settings.window.days(),
                cutoff.to_rfc3339()
            ),
        };
        self.store
            .commit_run(&snapshot, &FetchOutcome::success(summary.outcome_detail()))
            .await?;

        Ok(summary)
    }
}

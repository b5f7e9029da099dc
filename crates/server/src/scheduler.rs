//! Daily cron trigger for the ingestion pipeline.
//!
//! One job, evaluated in UTC. The loop sleeps until the next fire time, runs
//! the orchestrator, and repeats until [`SchedulerHandle::shutdown`] is called.
//! Shutdown during a run drops the run; the store's `replace` is transactional
//! so an interrupted run leaves the previous snapshot in place.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bounce_ingest::{IngestionOrchestrator, RunReport, TriggerKind};

pub const DAILY_JOB_ID: &str = "daily_bounced_fetch";

/// Parse a cron expression, auto-prepending "0 " for 5-field expressions.
///
/// The `cron` crate requires 6 fields (sec min hr dom mon dow).
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() == 5 {
        Schedule::from_str(&format!("0 {}", expr.trim()))
    } else {
        Schedule::from_str(expr.trim())
    }
}

/// The recurring fetch job and its parsed schedule.
#[derive(Debug, Clone)]
pub struct DailyJob {
    expression: String,
    schedule: Schedule,
}

impl DailyJob {
    pub fn new(expression: &str) -> Result<Self, cron::error::Error> {
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule: parse_cron(expression)?,
        })
    }

    pub fn id(&self) -> &'static str {
        DAILY_JOB_ID
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.schedule.upcoming(Utc).next()
    }

    pub fn next_run_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }

    /// Human-readable trigger description for `/schedule-info`.
    pub fn trigger(&self) -> String {
        format!("cron[{}] UTC", self.expression)
    }
}

/// Running scheduler task plus the means to stop it.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn spawn(job: DailyJob, orchestrator: Arc<IngestionOrchestrator>) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(job, orchestrator, rx));
        Self { shutdown, task }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
        info!("scheduler shut down");
    }
}

async fn run_loop(job: DailyJob, orchestrator: Arc<IngestionOrchestrator>, mut shutdown: watch::Receiver<bool>) {
    info!(job_id = job.id(), cron = %job.expression, "scheduler started");
    let mut after = Utc::now();

    loop {
        let Some(next) = job.next_run_after(&after) else {
            warn!(job_id = job.id(), "cron schedule has no upcoming fire time, scheduler stopping");
            return;
        };
        info!(job_id = job.id(), next_run = %next, "next scheduled fetch");

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => return,
        }
        after = next;

        tokio::select! {
            report = orchestrator.run(TriggerKind::Scheduled) => log_report(&report),
            _ = shutdown.changed() => {
                warn!(job_id = job.id(), "shutdown during scheduled run, run abandoned");
                return;
            }
        }
    }
}

fn log_report(report: &RunReport) {
    match report {
        RunReport::Success { total_bounced_emails, total_campaigns, .. } => info!(
            job_id = DAILY_JOB_ID,
            bounced = total_bounced_emails,
            campaigns = total_campaigns,
            "scheduled fetch finished"
        ),
        RunReport::Error { message, .. } => warn!(job_id = DAILY_JOB_ID, error = %message, "scheduled fetch failed"),
        RunReport::Skipped { message } => info!(job_id = DAILY_JOB_ID, reason = %message, "scheduled fetch skipped"),
    }
}

//! Scripted [`BounceSource`] doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Notify;

use bounce_core::{Campaign, ConfigError};

use crate::error::IngestError;
use crate::source::{BounceSource, PageRequest};

/// Response queued for one `bounce_page` call.
#[derive(Debug, Clone)]
pub enum ScriptedPage {
    Body(Value),
    /// Non-2xx with this status.
    Fail(u16),
}

/// Replays queued pages per campaign; an exhausted queue answers `[]`.
pub struct ScriptedSource {
    campaigns: Result<Vec<Campaign>, u16>,
    pages: Mutex<HashMap<String, VecDeque<ScriptedPage>>>,
    credential: Option<ConfigError>,
    pub page_requests: Mutex<Vec<PageRequest>>,
    pub campaign_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(campaigns: Vec<Campaign>) -> Self {
        Self {
            campaigns: Ok(campaigns),
            pages: Mutex::new(HashMap::new()),
            credential: None,
            page_requests: Mutex::new(Vec::new()),
            campaign_calls: AtomicUsize::new(0),
        }
    }

    /// Campaign listing fails with this HTTP status.
    pub fn failing_campaigns(status: u16) -> Self {
        let mut source = Self::new(Vec::new());
        source.campaigns = Err(status);
        source
    }

    pub fn without_credentials(mut self) -> Self {
        self.credential = Some(ConfigError::MissingCredential);
        self
    }

    pub fn with_pages(self, campaign_id: &str, pages: Vec<ScriptedPage>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(campaign_id.to_string(), pages.into());
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_requests.lock().unwrap().len()
    }

    pub fn page_calls_for(&self, campaign_id: &str) -> Vec<PageRequest> {
        self.page_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.campaign_id.to_string() == campaign_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BounceSource for ScriptedSource {
    fn check_credentials(&self) -> Result<(), IngestError> {
        match &self.credential {
            Some(e) => Err(IngestError::Configuration(e.clone())),
            None => Ok(()),
        }
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, IngestError> {
        self.campaign_calls.fetch_add(1, Ordering::SeqCst);
        match &self.campaigns {
            Ok(c) => Ok(c.clone()),
            Err(status) => Err(IngestError::Upstream {
                endpoint: "/campaigns".to_string(),
                status: Some(*status),
                detail: format!("HTTP {}", status),
            }),
        }
    }

    async fn bounce_page(&self, request: &PageRequest) -> Result<Value, IngestError> {
        self.page_requests.lock().unwrap().push(request.clone());
        let next = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&request.campaign_id.to_string())
            .and_then(VecDeque::pop_front);

        match next {
            Some(ScriptedPage::Body(body)) => Ok(body),
            Some(ScriptedPage::Fail(status)) => Err(IngestError::Upstream {
                endpoint: format!("/campaigns/{}/statistics", request.campaign_id),
                status: Some(status),
                detail: format!("HTTP {}", status),
            }),
            None => Ok(json!([])),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// Blocks inside `list_campaigns` until released, to hold a run open.
pub struct GatedSource {
    pub entered: Notify,
    pub release: Notify,
    pub campaign_calls: AtomicUsize,
}

impl GatedSource {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            campaign_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BounceSource for GatedSource {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, IngestError> {
        self.campaign_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }

    async fn bounce_page(&self, _request: &PageRequest) -> Result<Value, IngestError> {
        Ok(json!([]))
    }

    fn source_name(&self) -> &str {
        "gated"
    }
}

/// Provider-shaped bounce entry sent `days_ago` days before now.
pub fn entry(email: &str, days_ago: i64) -> Value {
    let sent = (Utc::now() - Duration::days(days_ago)).to_rfc3339();
    json!({
        "lead_email": email,
        "from_email": "outreach@sender.io",
        "email_message": "<p>Hello</p>",
        "email_subject": "Quick question",
        "sent_time": sent,
        "sequence_number": 1,
        "is_bounced": true,
    })
}

/// `n` recent entries with distinct addresses, prefixed by `tag`.
pub fn recent_entries(tag: &str, n: usize) -> Vec<Value> {
    (0..n).map(|i| entry(&format!("{}-{}@lead.io", tag, i), 1)).collect()
}

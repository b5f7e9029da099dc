//! Transport seam between the pipeline and the provider API.

use async_trait::async_trait;
use serde::Deserialize;

use bounce_core::{Campaign, CampaignId};

use crate::error::IngestError;

/// One `GET /campaigns/{id}/statistics` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub campaign_id: CampaignId,
    pub offset: u64,
    pub limit: u32,
}

/// A bounce entry as the provider sends it. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBounceEntry {
    pub lead_email: Option<String>,
    pub from_email: Option<String>,
    pub email_message: Option<String>,
    pub email_subject: Option<String>,
    pub sent_time: Option<String>,
    pub sequence_number: Option<i64>,
    pub is_bounced: Option<bool>,
}

/// Remote source of campaigns and bounce statistics.
///
/// Implementations perform exactly one request per call and never retry.
/// `bounce_page` returns the decoded body untouched; shape normalization is
/// the fetcher's job.
#[async_trait]
pub trait BounceSource: Send + Sync {
    /// Fail fast when the source cannot authenticate, before any request.
    fn check_credentials(&self) -> Result<(), IngestError> {
        Ok(())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, IngestError>;

    async fn bounce_page(&self, request: &PageRequest) -> Result<serde_json::Value, IngestError>;

    /// Human-readable name for logs (e.g. "smartlead").
    fn source_name(&self) -> &str;
}

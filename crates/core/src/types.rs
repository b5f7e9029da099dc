//! Domain types shared by the ingestion pipeline, the snapshot store and the
//! HTTP surface.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Campaigns ─────────────────────────────────────────────────

/// Provider-assigned campaign identifier.
///
/// SmartLead sends numeric ids, but nothing in the pipeline depends on that,
/// so string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CampaignId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignId::Number(n) => write!(f, "{}", n),
            CampaignId::Text(s) => f.write_str(s),
        }
    }
}

/// A campaign as listed by `GET /campaigns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

impl Campaign {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: CampaignId::Number(id),
            name: name.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Bounce records ────────────────────────────────────────────

/// Delivery status stamped on every stored record. Only bounces are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Bounced,
}

/// One bounced send, as persisted in the snapshot.
///
/// Field names on the wire match the JSON layout served by `/bounced-emails`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BounceRecord {
    #[serde(rename = "email_address")]
    pub recipient_address: Option<String>,
    #[serde(rename = "from_email")]
    pub sender_address: Option<String>,
    #[serde(rename = "email_message")]
    pub message_body: Option<String>,
    #[serde(rename = "email_subject")]
    pub subject: Option<String>,
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    #[serde(rename = "email_status")]
    pub status: EmailStatus,
    /// The provider's timestamp string, kept verbatim.
    #[serde(rename = "sent_time")]
    pub sent_at: String,
    pub sequence_number: Option<i64>,
    pub is_bounced: bool,
}

// ── Snapshot ──────────────────────────────────────────────────

/// The complete result of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<BounceRecord>,
    pub campaigns_count: usize,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(records: Vec<BounceRecord>, campaigns_count: usize) -> Self {
        Self {
            records,
            campaigns_count,
            created_at: Utc::now(),
        }
    }

    pub fn records_count(&self) -> usize {
        self.records.len()
    }
}

// ── Fetch outcomes ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for OutcomeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(OutcomeStatus::Success),
            "error" => Ok(OutcomeStatus::Error),
            other => Err(format!("unknown outcome status '{}'", other)),
        }
    }
}

/// Audit entry describing how one ingestion run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    #[serde(rename = "status")]
    pub result: OutcomeStatus,
    #[serde(rename = "message")]
    pub detail: String,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
}

impl FetchOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            result: OutcomeStatus::Success,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            result: OutcomeStatus::Error,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}

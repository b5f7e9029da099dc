//! Campaign Paginator: walks one campaign's bounce statistics.
//!
//! Per campaign the state is `(offset, accumulated)`. Each iteration fetches
//! the page at `offset` and keeps the entries inside the recency window.
//! The walk ends as
//! - [`Termination::Exhausted`] on an empty page or a page shorter than the limit,
//! - [`Termination::Aborted`] when a fetch fails. Records gathered so far are kept.
//!
//! Offsets depend on the previous page, so pages are strictly sequential.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use bounce_core::{BounceRecord, Campaign, EmailStatus};

use crate::fetcher::{fetch_page, Page};
use crate::recency::is_recent;
use crate::source::{BounceSource, PageRequest, RawBounceEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Exhausted,
    Aborted { reason: String },
}

/// Everything one campaign contributed to a run.
#[derive(Debug, Clone)]
pub struct CampaignHarvest {
    pub campaign: Campaign,
    pub records: Vec<BounceRecord>,
    /// Pages that came back successfully.
    pub pages_fetched: u32,
    /// Entries dropped as undecodable or undated.
    pub skipped_entries: u32,
    pub termination: Termination,
}

impl CampaignHarvest {
    pub fn is_aborted(&self) -> bool {
        matches!(self.termination, Termination::Aborted { .. })
    }
}

pub struct CampaignPaginator<'a> {
    source: &'a dyn BounceSource,
    page_size: u32,
    cutoff: DateTime<Utc>,
}

impl<'a> CampaignPaginator<'a> {
    pub fn new(source: &'a dyn BounceSource, page_size: u32, cutoff: DateTime<Utc>) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            cutoff,
        }
    }

    pub async fn harvest(&self, campaign: &Campaign) -> CampaignHarvest {
        let mut harvest = CampaignHarvest {
            campaign: campaign.clone(),
            records: Vec::new(),
            pages_fetched: 0,
            skipped_entries: 0,
            termination: Termination::Exhausted,
        };
        let mut offset: u64 = 0;

        loop {
            let request = PageRequest {
                campaign_id: campaign.id.clone(),
                offset,
                limit: self.page_size,
            };

            let entries = match fetch_page(self.source, &request).await {
                Ok(Page::Entries(entries)) => entries,
                Ok(Page::Exhausted) => break,
                Err(e) => {
                    if e.is_fatal() {
                        error!(campaign_id = %campaign.id, offset, error = %e, "stopping pagination for campaign");
                    } else {
                        warn!(campaign_id = %campaign.id, offset, error = %e, "stopping pagination for campaign");
                    }
                    harvest.termination = Termination::Aborted { reason: e.to_string() };
                    break;
                }
            };
            harvest.pages_fetched += 1;

            let page_len = entries.len();
            for value in entries {
                match self.to_record(campaign, value) {
                    Ok(Some(record)) => harvest.records.push(record),
                    Ok(None) => {}
                    Err(()) => harvest.skipped_entries += 1,
                }
            }

            if page_len < self.page_size as usize {
                break;
            }
            offset += u64::from(self.page_size);
        }

        info!(
            campaign_id = %campaign.id,
            campaign = %campaign.name,
            records = harvest.records.len(),
            pages = harvest.pages_fetched,
            skipped = harvest.skipped_entries,
            aborted = harvest.is_aborted(),
            "campaign bounces collected"
        );
        harvest
    }

    /// `Ok(Some)` inside the window, `Ok(None)` stale or malformed, `Err` unusable.
    fn to_record(&self, campaign: &Campaign, value: Value) -> Result<Option<BounceRecord>, ()> {
        let entry: RawBounceEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(campaign_id = %campaign.id, error = %e, "skipping undecodable bounce entry");
                return Err(());
            }
        };

        let sent_time = match entry.sent_time {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                debug!(campaign_id = %campaign.id, "skipping bounce entry without sent_time");
                return Err(());
            }
        };

        if !is_recent(sent_time.trim(), self.cutoff) {
            return Ok(None);
        }

        Ok(Some(BounceRecord {
            recipient_address: entry.lead_email,
            sender_address: entry.from_email,
            message_body: entry.email_message,
            subject: entry.email_subject,
            campaign_id: campaign.id.clone(),
            campaign_name: campaign.name.clone(),
            status: EmailStatus::Bounced,
            sent_at: sent_time,
            sequence_number: entry.sequence_number,
            is_bounced: entry.is_bounced.unwrap_or(true),
        }))
    }
}

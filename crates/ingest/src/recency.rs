//! Trailing-window filter on provider `sent_time` strings.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use tracing::warn;

use crate::error::IngestError;

/// Offset-bearing layouts tried after RFC 3339 (`%z` also takes `+0000`).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Zone-less layouts, read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    days: u32,
}

impl RecencyWindow {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Oldest instant still inside the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.days))
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(7)
    }
}

/// Parse a provider timestamp into UTC.
///
/// A trailing `Z`/`z` designator is rewritten to `+00:00` before parsing.
pub fn parse_sent_at(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    let trimmed = raw.trim();
    let normalized = match trimmed.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        Some(stem) => format!("{}+00:00", stem),
        None => trimmed.to_string(),
    };

    let first_err = match DateTime::parse_from_rfc3339(&normalized) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(IngestError::MalformedTimestamp {
        value: raw.to_string(),
        reason: first_err.to_string(),
    })
}

/// `true` iff `raw` parses and is at or after `cutoff`.
///
/// Malformed input is logged and yields `false`.
pub fn is_recent(raw: &str, cutoff: DateTime<Utc>) -> bool {
    match parse_sent_at(raw) {
        Ok(sent_at) => sent_at >= cutoff,
        Err(e) => {
            warn!(error = %e, "skipping bounce with malformed sent_time");
            false
        }
    }
}

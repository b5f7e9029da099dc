//! Page Fetcher: one statistics page, normalized.
//!
//! The provider answers either with a bare JSON list or with `{"data": [...]}`.
//! [`ResponseShape::classify`] decides which, once, and everything past this
//! module only sees [`Page`].

use serde_json::Value;
use tracing::debug;

use crate::error::IngestError;
use crate::source::{BounceSource, PageRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Recognized(Vec<Value>),
    /// JSON kind that was found instead, for the error message.
    Unrecognized(&'static str),
}

impl ResponseShape {
    pub fn classify(body: Value) -> Self {
        match body {
            Value::Array(entries) => ResponseShape::Recognized(entries),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(entries)) => ResponseShape::Recognized(entries),
                Some(_) => ResponseShape::Unrecognized("object whose 'data' is not a list"),
                None => ResponseShape::Unrecognized("object without 'data'"),
            },
            Value::Null => ResponseShape::Unrecognized("null"),
            Value::Bool(_) => ResponseShape::Unrecognized("boolean"),
            Value::Number(_) => ResponseShape::Unrecognized("number"),
            Value::String(_) => ResponseShape::Unrecognized("string"),
        }
    }
}

/// One page of raw entries, or the end of the campaign's statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Entries(Vec<Value>),
    Exhausted,
}

/// Fetch and normalize the page described by `request`.
pub async fn fetch_page(source: &dyn BounceSource, request: &PageRequest) -> Result<Page, IngestError> {
    let body = source.bounce_page(request).await?;

    match ResponseShape::classify(body) {
        ResponseShape::Recognized(entries) if entries.is_empty() => Ok(Page::Exhausted),
        ResponseShape::Recognized(entries) => {
            debug!(
                campaign_id = %request.campaign_id,
                offset = request.offset,
                entries = entries.len(),
                "fetched bounce page"
            );
            Ok(Page::Entries(entries))
        }
        ResponseShape::Unrecognized(found) => Err(IngestError::UnrecognizedResponseShape {
            campaign_id: request.campaign_id.to_string(),
            found: found.to_string(),
        }),
    }
}

//! SmartLead REST client.
//!
//! Authentication is the `api_key` query parameter, which means request URLs
//! carry the secret. Every `reqwest` error is therefore routed through
//! [`IngestError::transport`], which drops the URL before formatting.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use bounce_core::config::ProviderConfig;
use bounce_core::Campaign;

use crate::error::IngestError;
use crate::source::{BounceSource, PageRequest};

/// Longest slice of an error body kept in [`IngestError::Upstream`].
const MAX_ERROR_BODY: usize = 200;

pub struct SmartleadClient {
    config: ProviderConfig,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl SmartleadClient {
    pub fn new(config: ProviderConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| IngestError::transport("client", e))?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response, IngestError> {
        let api_key = self.config.credential()?;
        let url = format!("{}{}", self.config.base_url, path);

        debug!(endpoint = path, "smartlead request");
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key)])
            .query(query)
            .send()
            .await
            .map_err(|e| IngestError::transport(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(IngestError::Upstream {
                endpoint: path.to_string(),
                status: Some(status.as_u16()),
                detail: format!("HTTP {}: {}", status, snippet),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BounceSource for SmartleadClient {
    fn check_credentials(&self) -> Result<(), IngestError> {
        self.config.credential()?;
        Ok(())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, IngestError> {
        let path = "/campaigns";
        self.get(path, &[])
            .await?
            .json::<Vec<Campaign>>()
            .await
            .map_err(|e| IngestError::transport(path, e))
    }

    async fn bounce_page(&self, request: &PageRequest) -> Result<Value, IngestError> {
        let path = format!("/campaigns/{}/statistics", request.campaign_id);
        let query = [
            ("email_status", "bounced".to_string()),
            ("offset", request.offset.to_string()),
            ("limit", request.limit.to_string()),
        ];
        self.get(&path, &query)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| IngestError::transport(&path, e))
    }

    fn source_name(&self) -> &str {
        "smartlead"
    }
}

use bounce_core::ConfigError;
use bounce_storage::StorageError;

/// How far an error reaches inside one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Aborts the run; the orchestrator reports `error`.
    Run,
    /// Stops pagination of the current campaign only.
    Campaign,
    /// Skips a single bounce entry.
    Record,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Non-2xx response (`status` set) or transport failure (`status` empty).
    /// `endpoint` is the request path only; the API key never appears here.
    #[error("upstream error on {endpoint}: {detail}")]
    Upstream {
        endpoint: String,
        status: Option<u16>,
        detail: String,
    },

    #[error(
        "unrecognized response shape for campaign {campaign_id}: expected a list or an object with a 'data' list, got {found}"
    )]
    UnrecognizedResponseShape { campaign_id: String, found: String },

    #[error("could not parse sent_time '{value}': {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Wrap a `reqwest` failure, stripping the URL (it carries the API key).
    pub fn transport(endpoint: &str, err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        IngestError::Upstream {
            endpoint: endpoint.to_string(),
            status,
            detail: err.without_url().to_string(),
        }
    }

    /// Where this error stops the pipeline when raised by a page fetch.
    ///
    /// Upstream failures are campaign-local here; the enumerator escalates
    /// its own failures regardless of scope.
    pub fn scope(&self) -> ErrorScope {
        match self {
            IngestError::Configuration(_) | IngestError::Storage(_) => ErrorScope::Run,
            IngestError::Upstream { .. } | IngestError::UnrecognizedResponseShape { .. } => {
                ErrorScope::Campaign
            }
            IngestError::MalformedTimestamp { .. } => ErrorScope::Record,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.scope() == ErrorScope::Run
    }
}

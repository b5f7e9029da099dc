use thiserror::Error;

/// Configuration problems that make an ingestion run impossible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SMARTLEAD_API_KEY is not set")]
    MissingCredential,

    #[error("SMARTLEAD_API_KEY still holds the placeholder value; set a real API key")]
    PlaceholderCredential,
}

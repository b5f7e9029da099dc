use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Value shipped in sample `.env` files; treated the same as an unset key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

pub const DEFAULT_BASE_URL: &str = "https://server.smartlead.ai/api/v1";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `BOUNCE_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("BOUNCE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            provider: ProviderConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  storage:   database={}", self.storage.database_path.display());
        tracing::info!(
            "  provider:  base_url={}, api_key={}, timeout={}s",
            self.provider.base_url,
            self.provider.credential_label(),
            self.provider.timeout_secs
        );
        tracing::info!(
            "  ingest:    window={}d, page_size={}, concurrency={}, cron='{}', scheduler={}",
            self.ingest.window_days,
            self.ingest.page_size,
            self.ingest.campaign_concurrency,
            self.ingest.cron,
            if self.ingest.scheduler_enabled { "on" } else { "off" }
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8000),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            database_path: PathBuf::from(profiled_env_or(p, "DATABASE_PATH", "bounced_emails.db")),
        }
    }
}

// ── Provider (SmartLead) ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout for every provider call.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "SMARTLEAD_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: profiled_env_opt(p, "SMARTLEAD_API_KEY"),
            timeout_secs: profiled_env_parse(p, "FETCH_TIMEOUT_SECS", 60),
        }
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: 60,
        }
    }

    /// The usable API key, or the reason there is none.
    pub fn credential(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            None | Some("") => Err(ConfigError::MissingCredential),
            Some(PLACEHOLDER_API_KEY) => Err(ConfigError::PlaceholderCredential),
            Some(key) => Ok(key),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential().is_ok()
    }

    fn credential_label(&self) -> &'static str {
        match self.credential() {
            Ok(_) => "(set)",
            Err(ConfigError::PlaceholderCredential) => "(placeholder)",
            Err(_) => "(missing)",
        }
    }
}

// ── Ingestion ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Length of the trailing recency window.
    pub window_days: u32,
    /// `limit` sent with every statistics page request.
    pub page_size: u32,
    /// Campaigns paginated at once. Pagination inside a campaign is always sequential.
    pub campaign_concurrency: usize,
    /// Daily trigger, 5- or 6-field cron, evaluated in UTC.
    pub cron: String,
    pub scheduler_enabled: bool,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            window_days: profiled_env_parse(p, "BOUNCE_WINDOW_DAYS", 7),
            page_size: profiled_env_parse::<u32>(p, "PAGE_SIZE", 100).max(1),
            campaign_concurrency: profiled_env_parse::<usize>(p, "CAMPAIGN_CONCURRENCY", 1).max(1),
            cron: profiled_env_or(p, "FETCH_CRON", "0 3 * * *"),
            scheduler_enabled: profiled_env_bool(p, "SCHEDULER_ENABLED", true),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            page_size: 100,
            campaign_concurrency: 1,
            cron: "0 3 * * *".to_string(),
            scheduler_enabled: true,
        }
    }
}

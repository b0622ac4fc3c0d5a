//! Run configuration
//!
//! Loaded once from the environment at startup, validated, then passed by
//! reference into the pipeline. Nothing here is mutable after load.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

// ============================================================================
// Defaults
// ============================================================================

/// Default asset categories included in every export.
pub const DEFAULT_ASSET_TYPES: &[&str] = &[
    "compute.googleapis.com/Instance",
    "storage.googleapis.com/Bucket",
    "container.googleapis.com/Cluster",
    "sqladmin.googleapis.com/Instance",
];

/// Default Cloud Asset Inventory API base.
pub const DEFAULT_ASSET_API_BASE: &str = "https://cloudasset.googleapis.com";

/// Default Cloud Storage JSON API base.
pub const DEFAULT_STORAGE_API_BASE: &str = "https://storage.googleapis.com";

/// Default GCE metadata server base.
pub const DEFAULT_METADATA_BASE: &str = "http://metadata.google.internal";

/// Default Notion API base.
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com";

/// Default delay between export-operation polls, in milliseconds.
pub const DEFAULT_EXPORT_POLL_MS: u64 = 5_000;

/// Default archive mutation budget (one archive per ~300ms).
pub const DEFAULT_ARCHIVE_RPS: f64 = 3.3;

/// Default write-batch budget (one batch per ~500ms).
pub const DEFAULT_BATCH_RPS: f64 = 2.0;

// ============================================================================
// Configuration
// ============================================================================

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source project identifiers to export from
    pub projects: Vec<String>,
    /// Asset type filters applied to every export
    pub asset_types: Vec<String>,
    /// Staging bucket the export service writes to and the run cleans up
    pub staging_bucket: String,
    pub gcp: GcpConfig,
    pub notion: NotionConfig,
    pub limits: RateLimits,
}

/// Google API endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Cloud Asset Inventory API base URL
    pub asset_api_base: String,
    /// Cloud Storage JSON API base URL
    pub storage_api_base: String,
    /// Metadata server base URL (token source when no override is set)
    pub metadata_base: String,
    /// Pre-issued OAuth2 access token; skips the metadata server entirely
    pub access_token: Option<String>,
    /// Delay between export-operation polls, in milliseconds
    pub export_poll_ms: u64,
}

/// Destination database credentials and endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration bearer token
    pub token: String,
    /// Database to mirror into
    pub database_id: String,
    /// API base URL
    pub api_base: String,
}

/// Requests-per-second budgets for destination pacing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimits {
    /// Budget for archive mutations during the clear phase
    pub archive_rps: f64,
    /// Budget for write batches during the create phase
    pub batch_rps: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            asset_types: DEFAULT_ASSET_TYPES.iter().map(|s| s.to_string()).collect(),
            staging_bucket: String::new(),
            gcp: GcpConfig::default(),
            notion: NotionConfig::default(),
            limits: RateLimits::default(),
        }
    }
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            asset_api_base: DEFAULT_ASSET_API_BASE.to_string(),
            storage_api_base: DEFAULT_STORAGE_API_BASE.to_string(),
            metadata_base: DEFAULT_METADATA_BASE.to_string(),
            access_token: None,
            export_poll_ms: DEFAULT_EXPORT_POLL_MS,
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            api_base: DEFAULT_NOTION_API_BASE.to_string(),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            archive_rps: DEFAULT_ARCHIVE_RPS,
            batch_rps: DEFAULT_BATCH_RPS,
        }
    }
}

impl SyncConfig {
    /// Load configuration from the environment and validate it.
    ///
    /// Environment variables:
    /// - `AIM_PROJECTS`: comma-separated project ids (required)
    /// - `AIM_ASSET_TYPES`: comma-separated asset types (defaulted)
    /// - `AIM_STAGING_BUCKET`: staging bucket name (required)
    /// - `AIM_ASSET_API_BASE`, `AIM_STORAGE_API_BASE`, `AIM_METADATA_BASE`:
    ///   endpoint overrides, mainly for tests
    /// - `AIM_GOOGLE_TOKEN`: pre-issued access token override
    /// - `AIM_EXPORT_POLL_MS`: export operation poll interval
    /// - `AIM_NOTION_TOKEN`, `AIM_NOTION_DATABASE`: destination credentials
    ///   (required)
    /// - `AIM_NOTION_API_BASE`: destination endpoint override
    /// - `AIM_ARCHIVE_RPS`, `AIM_BATCH_RPS`: pacing budgets
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = SyncConfig::default();

        let config = SyncConfig {
            projects: std::env::var("AIM_PROJECTS")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            asset_types: std::env::var("AIM_ASSET_TYPES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.asset_types),
            staging_bucket: std::env::var("AIM_STAGING_BUCKET").unwrap_or_default(),
            gcp: GcpConfig {
                asset_api_base: std::env::var("AIM_ASSET_API_BASE")
                    .unwrap_or(defaults.gcp.asset_api_base),
                storage_api_base: std::env::var("AIM_STORAGE_API_BASE")
                    .unwrap_or(defaults.gcp.storage_api_base),
                metadata_base: std::env::var("AIM_METADATA_BASE")
                    .unwrap_or(defaults.gcp.metadata_base),
                access_token: std::env::var("AIM_GOOGLE_TOKEN").ok(),
                export_poll_ms: std::env::var("AIM_EXPORT_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_EXPORT_POLL_MS),
            },
            notion: NotionConfig {
                token: std::env::var("AIM_NOTION_TOKEN").unwrap_or_default(),
                database_id: std::env::var("AIM_NOTION_DATABASE").unwrap_or_default(),
                api_base: std::env::var("AIM_NOTION_API_BASE")
                    .unwrap_or(defaults.notion.api_base),
            },
            limits: RateLimits {
                archive_rps: std::env::var("AIM_ARCHIVE_RPS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_ARCHIVE_RPS),
                batch_rps: std::env::var("AIM_BATCH_RPS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_BATCH_RPS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(SyncError::Config(
                "at least one source project is required (AIM_PROJECTS)".to_string(),
            ));
        }

        if self.staging_bucket.is_empty() {
            return Err(SyncError::Config(
                "staging bucket cannot be empty (AIM_STAGING_BUCKET)".to_string(),
            ));
        }

        if self.notion.token.is_empty() {
            return Err(SyncError::Config(
                "destination token cannot be empty (AIM_NOTION_TOKEN)".to_string(),
            ));
        }

        if self.notion.database_id.is_empty() {
            return Err(SyncError::Config(
                "destination database id cannot be empty (AIM_NOTION_DATABASE)".to_string(),
            ));
        }

        for (name, rps) in [
            ("AIM_ARCHIVE_RPS", self.limits.archive_rps),
            ("AIM_BATCH_RPS", self.limits.batch_rps),
        ] {
            if !rps.is_finite() || rps <= 0.0 {
                return Err(SyncError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, rps
                )));
            }
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

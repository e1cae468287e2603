use serde::Deserialize;
use url::Url;

use crate::ConfigError;

/// Main configuration structure for Vancian
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

impl Config {
    /// Resolves the full starting index URL from base URL and index path
    pub fn index_url(&self) -> Result<Url, ConfigError> {
        let base = Url::parse(&self.catalog.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        base.join(&self.catalog.index_path)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid index-path: {}", e)))
    }

    /// Parses the catalog base URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.catalog.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))
    }
}

/// Catalog location and row filtering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the remote catalog
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path (relative to the base URL) of the first index page
    #[serde(rename = "index-path")]
    pub index_path: String,

    /// Source-book names whose entries are harvested; all other rows are
    /// skipped
    #[serde(rename = "allowed-origins")]
    pub allowed_origins: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent detail fetches
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Maximum attempts for a bounded-retry operation before it is treated
    /// as failed
    #[serde(rename = "retry-limit", default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Run mode handed to the rendering engine; advisory for engines that
    /// have no window to show
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Harvester identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "harvester-name")]
    pub harvester_name: String,

    /// Version of the harvester
    #[serde(rename = "harvester-version")]
    pub harvester_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.harvester_name, self.harvester_version, self.contact_url, self.contact_email
        )
    }
}

fn default_concurrency() -> u32 {
    4
}

fn default_retry_limit() -> u32 {
    10
}

fn default_headless() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Programme-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of detail pages fetched concurrently in one batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between two batches (milliseconds)
    #[serde(rename = "batch-delay-ms", default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Consecutive failed listing pages that end an open-ended discovery
    #[serde(
        rename = "discovery-failure-limit",
        default = "default_discovery_failure_limit"
    )]
    pub discovery_failure_limit: u32,
}

impl CrawlerConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            discovery_failure_limit: default_discovery_failure_limit(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default = "default_contact_email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identification header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
            contact_email: default_contact_email(),
        }
    }
}

/// The upstream site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Origin that relative links are resolved against
    #[serde(rename = "base-origin", default = "default_base_origin")]
    pub base_origin: String,

    /// First listing page, without the page-number parameter
    #[serde(rename = "listing-url", default = "default_listing_url")]
    pub listing_url: String,

    /// Query parameter carrying the listing page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// Last listing page; when absent discovery stops at the first empty page
    #[serde(rename = "last-page", default)]
    pub last_page: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_origin: default_base_origin(),
            listing_url: default_listing_url(),
            page_param: default_page_param(),
            last_page: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Discovered listing records (`[{name, url}]`)
    #[serde(rename = "listings-path", default = "default_listings_path")]
    pub listings_path: String,

    /// Successfully extracted programme records
    #[serde(rename = "programmes-path", default = "default_programmes_path")]
    pub programmes_path: String,

    /// Failed detail URLs (`[{url, error}]`)
    #[serde(rename = "failures-path", default = "default_failures_path")]
    pub failures_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,

    /// Path to the SQLite export database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            listings_path: default_listings_path(),
            programmes_path: default_programmes_path(),
            failures_path: default_failures_path(),
            summary_path: default_summary_path(),
            database_path: default_database_path(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_discovery_failure_limit() -> u32 {
    5
}

fn default_crawler_name() -> String {
    "ProgrammeHarvest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://example.com/about".to_string()
}

fn default_contact_email() -> String {
    "ops@example.com".to_string()
}

fn default_base_origin() -> String {
    "https://www.daad.de".to_string()
}

fn default_listing_url() -> String {
    "https://www.daad.de/en/studying-in-germany/universities/all-degree-programmes/?hec-limit=100"
        .to_string()
}

fn default_page_param() -> String {
    "hec-p".to_string()
}

fn default_listings_path() -> String {
    "universities.json".to_string()
}

fn default_programmes_path() -> String {
    "programs_detailed.json".to_string()
}

fn default_failures_path() -> String {
    "failed_urls.json".to_string()
}

fn default_summary_path() -> String {
    "harvest_summary.md".to_string()
}

fn default_database_path() -> String {
    "programmes.db".to_string()
}

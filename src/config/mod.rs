//! Configuration management for the scraper
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. The resulting [`Config`] value is passed
//! explicitly into every crawl entry point; nothing reads ambient settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Listing pages to crawl
    pub sources: SourcesConfig,

    /// Extraction heuristics
    pub extraction: ExtractionConfig,

    /// Geocoding collaborator
    pub geocoding: GeocodingConfig,

    /// Output files
    pub output: OutputConfig,

    /// Trigger API server
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site root, used for page URLs and to resolve relative detail links
    pub base_url: String,

    /// User agent string sent with every request
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per request (first try included)
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Minimum interval between listing page requests in milliseconds
    pub page_delay_ms: u64,

    /// Minimum interval between detail page requests in milliseconds
    pub detail_delay_ms: u64,

    /// Maximum pages per source (0 = unlimited)
    pub max_pages: u32,

    /// Fetch detail pages for fault/maintenance listings
    pub fetch_details: bool,
}

/// Paths of the listing pages, relative to `crawler.base_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Fault listing
    pub accident_path: String,

    /// Maintenance listing
    pub maintenance_path: String,

    /// Review listing (Tokyo by default)
    pub review_path: String,

    /// Usage record listing (Tokyo by default)
    pub usage_path: String,
}

/// Tunables of the extraction heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Review pages with fewer card records than this use the text fallback
    pub review_fallback_threshold: usize,

    /// Lookahead window of the review text fallback, in lines
    pub review_window: usize,

    /// Lookahead window of the usage text fallback, in lines
    pub usage_window: usize,

    /// Body characters that take part in the deduplication key
    pub dedup_prefix_chars: usize,

    /// Lines containing any of these tokens are page chrome, never body text
    pub chrome_tokens: Vec<String>,

    /// Optional TOML file replacing the built-in classifier rule table
    pub classifier_rules: Option<PathBuf>,
}

/// Geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Geocode listings after detail enrichment
    pub enabled: bool,

    /// Nominatim-compatible search endpoint
    pub endpoint: String,

    /// Country restriction passed as `countrycodes`
    pub country_codes: String,

    /// User agent required by the service usage policy
    pub user_agent: String,

    /// Minimum interval between lookups in milliseconds
    pub delay_ms: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for CSV files
    pub dir: PathBuf,

    /// File name of the fault/maintenance CSV inside `dir`
    pub status_csv: String,

    /// JSON mirror of the fault/maintenance list for the dashboard
    pub dashboard_json: PathBuf,
}

/// Trigger API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Capacity of the progress channel
    pub progress_buffer: usize,

    /// Close the stream when no progress arrives for this long
    pub idle_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://ev.gogo.gs"),
            user_agent: String::from(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            request_timeout_secs: 10,
            max_attempts: 3,
            retry_delay_ms: 2000,
            page_delay_ms: 1000,
            detail_delay_ms: 1500,
            max_pages: 100,
            fetch_details: true,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            accident_path: String::from("/accident"),
            maintenance_path: String::from("/maintenance"),
            review_path: String::from("/review/13"),
            usage_path: String::from("/using/13"),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            review_fallback_threshold: 5,
            review_window: 30,
            usage_window: 25,
            dedup_prefix_chars: 80,
            chrome_tokens: ["件", "ページ", "都道府県", "クチコミ", "充電スタンド"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            classifier_rules: None,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::from("https://nominatim.openstreetmap.org/search"),
            country_codes: String::from("jp"),
            user_agent: format!("EV-Charger-Scraper/{}", env!("CARGO_PKG_VERSION")),
            delay_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("DB"),
            status_csv: String::from("ev_status_list.csv"),
            dashboard_json: PathBuf::from("ev-charger-dashboard/public/data.json"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8000,
            allowed_origins: vec![
                String::from("http://localhost:5173"),
                String::from("http://localhost:3000"),
            ],
            progress_buffer: 256,
            idle_timeout_secs: 600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("EVSCRAPER_BASE_URL") {
            config.crawler.base_url = base_url;
        }

        if let Some(delay) = env_parse::<u64>("EVSCRAPER_PAGE_DELAY_MS") {
            config.crawler.page_delay_ms = delay;
        }

        if let Some(delay) = env_parse::<u64>("EVSCRAPER_DETAIL_DELAY_MS") {
            config.crawler.detail_delay_ms = delay;
        }

        if let Some(max_pages) = env_parse::<u32>("EVSCRAPER_MAX_PAGES") {
            config.crawler.max_pages = max_pages;
        }

        if let Ok(dir) = std::env::var("EVSCRAPER_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }

        if let Ok(json) = std::env::var("EVSCRAPER_DASHBOARD_JSON") {
            config.output.dashboard_json = PathBuf::from(json);
        }

        if let Some(enabled) = env_parse::<bool>("EVSCRAPER_GEOCODING") {
            config.geocoding.enabled = enabled;
        }

        if let Ok(level) = std::env::var("EVSCRAPER_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("EVSCRAPER_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.crawler.base_url).is_err() {
            anyhow::bail!("base_url is not a valid URL: {}", self.crawler.base_url);
        }

        if self.crawler.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.crawler.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.extraction.review_window == 0 || self.extraction.usage_window == 0 {
            anyhow::bail!("fallback windows must be greater than 0");
        }

        if self.extraction.dedup_prefix_chars == 0 {
            anyhow::bail!("dedup_prefix_chars must be greater than 0");
        }

        if self.server.progress_buffer == 0 {
            anyhow::bail!("progress_buffer must be greater than 0");
        }

        Ok(())
    }

    /// Absolute URL of a source path
    #[must_use]
    pub fn source_url(&self, path: &str) -> String {
        format!("{}{}", self.crawler.base_url.trim_end_matches('/'), path)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Pause between retry attempts
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.retry_delay_ms)
    }

    /// Minimum interval between listing page requests
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.page_delay_ms)
    }

    /// Minimum interval between detail page requests
    #[must_use]
    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.detail_delay_ms)
    }

    /// Minimum interval between geocoding lookups
    #[must_use]
    pub fn geocode_delay(&self) -> Duration {
        Duration::from_millis(self.geocoding.delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.crawler.page_delay_ms > 0);
        assert_eq!(config.crawler.request_timeout_secs, 10);
        assert_eq!(config.crawler.max_attempts, 3);
    }

    #[test]
    fn test_source_url() {
        let config = Config::default();
        assert_eq!(
            config.source_url(&config.sources.accident_path),
            "https://ev.gogo.gs/accident"
        );

        let mut config = Config::default();
        config.crawler.base_url = "http://127.0.0.1:8080/".into();
        assert_eq!(config.source_url("/using/13"), "http://127.0.0.1:8080/using/13");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            page_delay_ms = 1200

            [extraction]
            review_window = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.page_delay_ms, 1200);
        assert_eq!(config.crawler.detail_delay_ms, 1500);
        assert_eq!(config.extraction.review_window, 40);
        assert_eq!(config.extraction.usage_window, 25);
        assert!(config.extraction.chrome_tokens.contains(&"件".to_string()));
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = Config::default();
        config.crawler.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawler.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }
}

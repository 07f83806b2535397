//! Configuration management for the leadscan scanner
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scan orchestration and page-scanning settings
    pub scanner: ScannerConfig,

    /// AI-assisted classification settings
    pub classifier: ClassifierConfig,

    /// Counter persistence settings
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scan orchestration and page-scanning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Search results view the orchestrator navigates to
    pub search_base_url: String,

    /// Origin used to absolutize relative profile and post links
    pub site_origin: String,

    /// Minimum extracted text length for a post to be considered
    pub min_text_len: usize,

    /// Detection history capacity
    pub history_cap: usize,

    /// Delay between a batch report and the next keyword navigation (ms)
    pub settle_delay_ms: u64,

    /// Window in which re-issuing the same keyword navigation is dropped (ms)
    pub loop_cooldown_ms: u64,

    /// Page-side wait before collecting a search view (ms)
    pub search_settle_delay_ms: u64,

    /// Wait before the first passive scan of a feed page (ms)
    pub initial_scan_delay_ms: u64,

    /// Passive re-scan interval (ms)
    pub poll_interval_ms: u64,

    /// Maximum page loads per second
    pub requests_per_second: u32,

    /// Page load timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Reply timeout for request/response messages (ms)
    pub bus_timeout_ms: u64,
}

/// AI-assisted classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// API key; the AI stage is skipped when absent
    pub api_key: Option<String>,

    /// Text-generation endpoint base URL
    pub endpoint: String,

    /// Model tried first
    pub primary_model: String,

    /// Model retried once when the primary one does not exist
    pub fallback_model: String,

    /// Characters of post text sent to the model
    pub max_input_chars: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Counter persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding detection counters
    pub path: PathBuf,
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

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            search_base_url: String::from("https://www.linkedin.com/search/results/content/"),
            site_origin: String::from("https://www.linkedin.com"),
            min_text_len: 20,
            history_cap: 50,
            settle_delay_ms: 3000,
            loop_cooldown_ms: 5000,
            search_settle_delay_ms: 3000,
            initial_scan_delay_ms: 2000,
            poll_interval_ms: 5000,
            requests_per_second: 1,
            request_timeout_secs: 30,
            user_agent: format!("leadscan/{}", env!("CARGO_PKG_VERSION")),
            bus_timeout_ms: 10_000,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: String::from("https://generativelanguage.googleapis.com/v1beta"),
            primary_model: String::from("gemini-2.5-flash"),
            fallback_model: String::from("gemini-1.5-flash"),
            max_input_chars: 1000,
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/detections.json"),
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

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file, then let environment variables override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        let scanner = &mut self.scanner;
        if let Ok(url) = std::env::var("LEADSCAN_SEARCH_URL") {
            scanner.search_base_url = url;
        }
        if let Ok(origin) = std::env::var("LEADSCAN_SITE_ORIGIN") {
            scanner.site_origin = origin;
        }
        if let Some(v) = env_parse("LEADSCAN_SETTLE_DELAY_MS") {
            scanner.settle_delay_ms = v;
        }
        if let Some(v) = env_parse("LEADSCAN_LOOP_COOLDOWN_MS") {
            scanner.loop_cooldown_ms = v;
        }
        if let Some(v) = env_parse("LEADSCAN_POLL_INTERVAL_MS") {
            scanner.poll_interval_ms = v;
        }
        if let Some(v) = env_parse("LEADSCAN_RATE_LIMIT") {
            scanner.requests_per_second = v;
        }
        if let Some(v) = env_parse("LEADSCAN_REQUEST_TIMEOUT") {
            scanner.request_timeout_secs = v;
        }
        if let Ok(ua) = std::env::var("LEADSCAN_USER_AGENT") {
            scanner.user_agent = ua;
        }

        let classifier = &mut self.classifier;
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                classifier.api_key = Some(key);
            }
        }
        if let Ok(endpoint) = std::env::var("LEADSCAN_AI_ENDPOINT") {
            classifier.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("LEADSCAN_AI_MODEL") {
            classifier.primary_model = model;
        }
        if let Ok(model) = std::env::var("LEADSCAN_AI_FALLBACK_MODEL") {
            classifier.fallback_model = model;
        }

        if let Ok(path) = std::env::var("LEADSCAN_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Ok(level) = std::env::var("LEADSCAN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LEADSCAN_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scanner.min_text_len == 0 {
            anyhow::bail!("min_text_len must be greater than 0");
        }

        if self.scanner.history_cap == 0 {
            anyhow::bail!("history_cap must be greater than 0");
        }

        if self.scanner.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        if self.scanner.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        url::Url::parse(&self.scanner.search_base_url)
            .with_context(|| format!("Invalid search_base_url: {}", self.scanner.search_base_url))?;

        if self.classifier.max_input_chars == 0 {
            anyhow::bail!("max_input_chars must be greater than 0");
        }

        Ok(())
    }

    /// Delay between keywords
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.scanner.settle_delay_ms)
    }

    /// Loop protection window
    #[must_use]
    pub fn loop_cooldown(&self) -> Duration {
        Duration::from_millis(self.scanner.loop_cooldown_ms)
    }

    /// Reply timeout for bus requests
    #[must_use]
    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.scanner.bus_timeout_ms)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner.request_timeout_secs)
    }
}

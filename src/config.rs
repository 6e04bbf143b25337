//! Configuration file parser for ~/.config/feedme/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`; unknown keys are accepted but logged, since they are
//! usually typos.
use crate::feed::{
    default_feed_urls, valid_urls, AggregateOptions, FetchOptions, SourceErrorPolicy,
};
use crate::util::HostPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed URLs to aggregate. Empty means the built-in list.
    pub feeds: Vec<String>,

    /// Seconds to wait for each feed's response headers.
    pub request_timeout_secs: u64,

    /// Largest feed body accepted, in bytes.
    pub max_feed_bytes: usize,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// What a failed feed leaves in the output: "drop" or "inline".
    pub source_errors: SourceErrorPolicy,

    /// Allow feeds on localhost and private networks.
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            feeds: Vec::new(),
            request_timeout_secs: fetch.timeout.as_secs(),
            max_feed_bytes: fetch.max_bytes,
            user_agent: format!("feedme/{}", env!("CARGO_PKG_VERSION")),
            source_errors: SourceErrorPolicy::default(),
            allow_private_hosts: false,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "feeds",
        "request_timeout_secs",
        "max_feed_bytes",
        "user_agent",
        "source_errors",
        "allow_private_hosts",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file is never pulled into memory
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            source_errors = ?config.source_errors,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    pub fn host_policy(&self) -> HostPolicy {
        if self.allow_private_hosts {
            HostPolicy::AllowPrivate
        } else {
            HostPolicy::PublicOnly
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            fetch: FetchOptions {
                timeout: Duration::from_secs(self.request_timeout_secs),
                max_bytes: self.max_feed_bytes,
            },
            source_errors: self.source_errors,
        }
    }

    /// The configured feeds that pass validation, or the built-in list when
    /// none are configured.
    ///
    /// Configured feeds that all fail validation yield an empty list rather
    /// than the defaults, so a typo never silently widens what gets fetched.
    pub fn feed_urls(&self) -> Vec<Url> {
        if self.feeds.is_empty() {
            return default_feed_urls();
        }
        valid_urls(self.feeds.iter().map(String::as_str), self.host_policy())
    }
}

// ============================================================================
// Tests
// ============================================================================

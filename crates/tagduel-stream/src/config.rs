//! Configuration for stream sessions and polling

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tagduel_domain::TokenizerKind;

/// Configuration for pulling posts from a feed
///
/// # Examples
///
/// ```
/// use tagduel_stream::StreamConfig;
///
/// let config = StreamConfig::default();
/// assert_eq!(config.lang, "en");
/// assert!(config.hash_only);
/// assert!(!config.lang_none);
///
/// let config = StreamConfig::permissive();
/// assert!(!config.hash_only);
/// assert!(config.lang_none);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// ISO 639-1 code that accepted posts must declare
    /// Default: "en"
    pub lang: String,

    /// Also accept posts that declare no language at all
    /// Default: false
    pub lang_none: bool,

    /// Only accept posts whose structured hashtag list is non-empty
    /// Default: true
    pub hash_only: bool,

    /// Maximum accepted posts per session
    /// Default: 100
    pub limit: usize,

    /// Keep post metadata; when false posts are parsed from text alone
    /// Default: true
    pub keep_metadata: bool,

    /// Seconds between sessions in polling mode
    /// Default: 3600 (hourly)
    pub poll_interval_secs: u64,

    /// Tokenizer used for post text
    /// Default: whitespace
    pub tokenizer: TokenizerKind,

    /// Log a summary after each session
    /// Default: true
    pub verbose: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            lang_none: false,
            hash_only: true,
            limit: 100,
            keep_metadata: true,
            poll_interval_secs: 3600,
            tokenizer: TokenizerKind::Whitespace,
            verbose: true,
        }
    }
}

impl StreamConfig {
    /// Permissive preset: posts without hashtags or language are accepted
    pub fn permissive() -> Self {
        Self {
            lang_none: true,
            hash_only: false,
            ..Self::default()
        }
    }

    /// Poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.lang.trim().is_empty() {
            return Err("lang must not be empty".to_string());
        }
        if self.limit == 0 {
            return Err("limit must be greater than 0".to_string());
        }
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

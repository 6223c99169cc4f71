//! Configuration for the relationship builder

use serde::{Deserialize, Serialize};

/// Configuration for [`RelationshipBuilder`](crate::RelationshipBuilder)
///
/// # Examples
///
/// ```
/// use tagduel_relate::BuilderConfig;
///
/// let config = BuilderConfig::from_toml("max_id_retries = 50").unwrap();
/// assert_eq!(config.max_id_retries, 50);
/// assert_eq!(config.app_label, "tagduel");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Conflicting ids skipped before allocation gives up
    /// Default: 10000
    pub max_id_retries: u64,

    /// Prefix for fixture model names (`<app_label>.post` and so on)
    /// Default: "tagduel"
    pub app_label: String,

    /// Log every created record at debug level
    /// Default: true
    pub verbose: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_id_retries: 10_000,
            app_label: "tagduel".to_string(),
            verbose: true,
        }
    }
}

impl BuilderConfig {
    /// Quiet preset: no per-record logging
    pub fn quiet() -> Self {
        Self {
            verbose: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_id_retries == 0 {
            return Err("max_id_retries must be greater than 0".to_string());
        }
        if self.app_label.is_empty() {
            return Err("app_label must not be empty".to_string());
        }
        if self
            .app_label
            .chars()
            .any(|c| c == '.' || c.is_whitespace())
        {
            return Err(format!(
                "app_label must not contain dots or whitespace: {:?}",
                self.app_label
            ));
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

//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tagduel_relate::BuilderConfig;
use tagduel_stream::StreamConfig;

/// CLI configuration.
///
/// ```toml
/// [stream]
/// lang = "en"
/// hash_only = true
/// limit = 100
///
/// [builder]
/// app_label = "tagduel"
///
/// [settings]
/// database = "tagduel.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Feed filtering and polling
    #[serde(default)]
    pub stream: StreamConfig,

    /// Record building and fixture export
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default SQLite database for `load` and `watch`
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".tagduel").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default path is read if
    /// present, otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.stream
            .validate()
            .map_err(|e| CliError::Config(format!("[stream] {}", e)))?;
        self.builder
            .validate()
            .map_err(|e| CliError::Config(format!("[builder] {}", e)))?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            log_level: default_log_level(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("tagduel.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.settings.database, PathBuf::from("tagduel.db"));
        assert_eq!(config.builder.app_label, "tagduel");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[stream]\nlang = \"pt\"\nlimit = 20\n\n[settings]\ndatabase = \"/tmp/duel.db\"\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.stream.lang, "pt");
        assert_eq!(config.stream.limit, 20);
        assert!(config.stream.hash_only);
        assert_eq!(config.settings.database, PathBuf::from("/tmp/duel.db"));
        assert_eq!(config.settings.log_level, "info");
        assert_eq!(config.builder, BuilderConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[stream\nlang = ").unwrap();
        assert!(matches!(Config::load(Some(file.path())), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_validate_reports_section() {
        let mut config = Config::default();
        config.builder.max_id_retries = 0;

        match config.validate() {
            Err(CliError::Config(msg)) => assert!(msg.starts_with("[builder]")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}

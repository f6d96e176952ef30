use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::readiness::ScorerConfig;

/// Configuration format version
const CONFIG_VERSION: &str = "1";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Readiness scorer settings
    pub scorer: ScorerConfig,

    /// Data import preferences
    pub import: ImportSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Data directory path
    pub data_dir: PathBuf,

    /// Training-log database file name, relative to the data directory
    pub database_file: String,

    /// Session label used by `score` when none is passed
    pub default_session_label: Option<String>,
}

/// Data import preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Show a progress bar for file imports
    pub show_progress: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            metadata: ConfigMetadata {
                version: CONFIG_VERSION.to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings {
                data_dir: default_data_dir(),
                database_file: "training_log.db".to_string(),
                default_session_label: None,
            },
            scorer: ScorerConfig::default(),
            import: ImportSettings {
                show_progress: true,
            },
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("readyrs")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, or the default location, or fall back
    /// to defaults when no file exists yet
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, bumping the updated timestamp
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Full path of the training-log database
    pub fn database_path(&self) -> PathBuf {
        self.settings.data_dir.join(&self.settings.database_file)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readyrs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.metadata.version, CONFIG_VERSION);
        assert_eq!(config.settings.database_file, "training_log.db");
        assert_eq!(config.scorer.acwr.chronic_window_days, 28);
        assert!(config.import.show_progress);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.metadata.version, config.metadata.version);
        assert_eq!(parsed.settings.data_dir, config.settings.data_dir);
        assert_eq!(parsed.scorer, config.scorer);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.settings.default_session_label = Some("Push Day".to_string());
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(
            loaded.settings.default_session_label,
            Some("Push Day".to_string())
        );
        assert!(loaded.metadata.updated_at >= loaded.metadata.created_at);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert_eq!(config.metadata.version, CONFIG_VERSION);
    }

    #[test]
    fn test_database_path_joins_data_dir() {
        let mut config = AppConfig::default();
        config.settings.data_dir = PathBuf::from("/tmp/readyrs-test");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/readyrs-test/training_log.db")
        );
    }
}

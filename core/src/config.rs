//! Host bridge configuration
//!
//! Channel names and logging settings, serialized to/from JSON. Every field
//! has a default so a partial (or empty) document is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SYSTEM_SETTINGS_CHANNEL: &str = "edu.kit.teco.open_wearable/system_settings";
pub const DEFAULT_LIFECYCLE_CHANNEL: &str = "edu.kit.teco.open_wearable/lifecycle";
pub const DEFAULT_OPEN_FOLDER_CHANNEL: &str = "edu.teco.open_folder";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Names of the method channels the bridge answers on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct ChannelNames {
    pub system_settings: String,
    pub lifecycle: String,
    pub open_folder: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            system_settings: DEFAULT_SYSTEM_SETTINGS_CHANNEL.to_string(),
            lifecycle: DEFAULT_LIFECYCLE_CHANNEL.to_string(),
            open_folder: DEFAULT_OPEN_FOLDER_CHANNEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub channels: ChannelNames,
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> String {
        // Plain structs of strings and unit enums always serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load from `path`, falling back to defaults when the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// The lifecycle channel must not share a name with either settings
    /// channel; the settings and folder channels may coincide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channels = &self.channels;
        for (label, name) in [
            ("system_settings", &channels.system_settings),
            ("lifecycle", &channels.lifecycle),
            ("open_folder", &channels.open_folder),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{} channel name cannot be empty",
                    label
                )));
            }
        }

        if channels.lifecycle == channels.system_settings
            || channels.lifecycle == channels.open_folder
        {
            return Err(ConfigError::Invalid(
                "lifecycle channel must not share a name with a settings channel".to_string(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging filter cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.lifecycle, DEFAULT_LIFECYCLE_CHANNEL);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = HostConfig::from_json(r#"{"logging": {"format": "json"}}"#).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.channels, ChannelNames::default());
    }

    #[test]
    fn test_empty_channel_rejected() {
        let mut config = HostConfig::default();
        config.channels.open_folder = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_lifecycle_collision_rejected() {
        let mut config = HostConfig::default();
        config.channels.lifecycle = config.channels.system_settings.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shared_settings_channel_allowed() {
        let mut config = HostConfig::default();
        config.channels.open_folder = config.channels.system_settings.clone();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        assert!(matches!(
            HostConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("host.json");

        let mut config = HostConfig::default();
        config.logging.filter = "openwearable_core=debug".to_string();
        config.save(&path).unwrap();

        let loaded = HostConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = HostConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, HostConfig::default());
    }
}

// Configuration management for the desktop host
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/openwearable/config.json
// - Linux: ~/.config/openwearable/config.json
// - Windows: %APPDATA%\openwearable\config.json

use anyhow::{Context, Result};
use openwearable_core::{HostConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel names and logging, shared with the mobile shells
    #[serde(flatten)]
    pub host: HostConfig,

    /// Wall-clock seconds an extended-execution grant lasts before expiring
    pub background_budget_secs: u64,

    /// Write logs to a daily-rolling file here instead of stderr
    pub log_dir: Option<String>,

    /// Command used to open folders and URLs (platform default when unset)
    pub opener: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            background_budget_secs: 30,
            log_dir: None,
            opener: None,
        }
    }
}

pub const KEYS: &[&str] = &[
    "system_settings_channel",
    "lifecycle_channel",
    "open_folder_channel",
    "log_filter",
    "log_format",
    "background_budget_secs",
    "log_dir",
    "opener",
];

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("openwearable");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or defaults if it doesn't exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config
            .host
            .validate()
            .context("Invalid config file")?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        self.host.validate().context("Refusing to save invalid config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Set a config value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "system_settings_channel" => self.host.channels.system_settings = value.to_string(),
            "lifecycle_channel" => self.host.channels.lifecycle = value.to_string(),
            "open_folder_channel" => self.host.channels.open_folder = value.to_string(),
            "log_filter" => self.host.logging.filter = value.to_string(),
            "log_format" => {
                self.host.logging.format = match value {
                    "pretty" => LogFormat::Pretty,
                    "json" => LogFormat::Json,
                    _ => anyhow::bail!("Invalid log format (expected pretty or json): {}", value),
                }
            }
            "background_budget_secs" => {
                self.background_budget_secs = value.parse().context("Invalid number")?;
            }
            "log_dir" => self.log_dir = non_empty(value),
            "opener" => self.opener = non_empty(value),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        self.host.validate().context("Invalid value")?;
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "system_settings_channel" => Some(self.host.channels.system_settings.clone()),
            "lifecycle_channel" => Some(self.host.channels.lifecycle.clone()),
            "open_folder_channel" => Some(self.host.channels.open_folder.clone()),
            "log_filter" => Some(self.host.logging.filter.clone()),
            "log_format" => Some(
                match self.host.logging.format {
                    LogFormat::Pretty => "pretty",
                    LogFormat::Json => "json",
                }
                .to_string(),
            ),
            "background_budget_secs" => Some(self.background_budget_secs.to_string()),
            "log_dir" => self.log_dir.clone(),
            "opener" => self.opener.clone(),
            _ => None,
        }
    }

    /// All keys with their current values
    pub fn list(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .map(|key| (*key, self.get(key).unwrap_or_else(|| "(not set)".to_string())))
            .collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

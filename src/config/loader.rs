use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;
use crate::registry::PluginRegistry;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/plugin-manager/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("plugin-manager").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Loads, parses and validates the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks that every `[plugins.<name>]` entry is a table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, options) in &self.plugins {
            if !options.is_object() {
                return Err(ConfigError::ValidationError {
                    message: format!("Options for plugin '{}' must be a table", name),
                });
            }
        }
        Ok(())
    }

    /// Apply the scope and per-type settings to `registry`.
    ///
    /// Settings for unknown plugin types are skipped with a warning.
    pub fn apply(&self, registry: &mut PluginRegistry) {
        if self.scope.is_some() {
            registry.set_scope(self.scope.clone());
        }

        for (name, settings) in &self.settings {
            let Some(plugin_type) = registry.lookup_mut(name) else {
                tracing::warn!(plugin = %name, "Settings given for unknown plugin");
                continue;
            };
            for (key, value) in settings {
                plugin_type.settings_mut().set_raw(key, value.clone());
            }
        }
    }
}

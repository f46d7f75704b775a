//! Presence Logger Console Configuration
//!
//! The console configuration wraps the core [`PresenceConfig`] and adds
//! host-only settings. It is read from a TOML file; every key is optional
//! and missing keys take their default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use presence_core::PresenceConfig;

// ----------------------------------------------------------------------------
// Console Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the presence logger console
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliAppConfig {
    /// Core logger configuration
    pub presence: PresenceConfig,

    /// Host console settings
    pub console: ConsoleConfig,
}

/// Host-only settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Log file on the host filesystem
    pub log_path: PathBuf,

    /// Free heap reported by `STATUS`
    pub heap_bytes: u32,

    /// Largest payload the console transport accepts
    pub max_payload_bytes: usize,

    /// Wi-Fi networks the simulated radio reports per scan
    pub simulated_networks: usize,

    /// BLE devices the simulated radio reports per scan window
    pub simulated_devices: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("presence_log.txt"),
            heap_bytes: 180_000,
            max_payload_bytes: 512,
            simulated_networks: 3,
            simulated_devices: 4,
        }
    }
}

impl CliAppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)
            .map_err(|e| ConfigError::Loading(format!("Failed to load from {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a specific file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::FileSystem(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = self
            .to_toml()
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), toml_string)
            .map_err(|e| ConfigError::FileSystem(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.presence
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.console.max_payload_bytes < self.presence.protocol.max_chunk_size {
            return Err(ConfigError::Validation(format!(
                "Console payload limit {} is below the chunk size {}",
                self.console.max_payload_bytes, self.presence.protocol.max_chunk_size
            )));
        }

        if self.console.log_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("Log path must not be empty".to_string()));
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

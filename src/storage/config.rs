use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Largest single payload the read side will send (larger formats are omitted)
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

/// Settings for running both sides in one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// How long an applied snapshot is recognized as our own echo (0 disables)
    #[serde(default = "default_echo_window_ms")]
    pub echo_window_ms: u64,
}

impl BridgeConfig {
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            echo_window_ms: default_echo_window_ms(),
        }
    }
}

/// Diagnostic output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for messages on stderr
    #[serde(default = "default_level")]
    pub level: String,

    /// Level for messages in the log file
    #[serde(default = "default_file_level")]
    pub file_level: String,

    /// Optional log file; rotated daily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            file_level: default_file_level(),
            file: None,
        }
    }
}

// Default value functions for serde
fn default_max_payload_bytes() -> u64 {
    52_428_800 // 50MB
}

fn default_echo_window_ms() -> u64 {
    1000
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::debug!(
            "Config: max_payload_bytes={}, echo_window_ms={}",
            config.general.max_payload_bytes,
            config.bridge.echo_window_ms
        );

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        let toml_str = toml::to_string_pretty(config)
            .with_context(|| "Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../clipline.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::debug!("Wrote default configuration to {:?}", self.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.general.max_payload_bytes, 52_428_800);
        assert_eq!(config.bridge.echo_window(), Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file_level, "debug");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let example: Config = toml::from_str(include_str!("../../clipline.toml.example")).unwrap();
        assert_eq!(example, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
        [bridge]
        echo_window_ms = 0

        [logging]
        file = "/tmp/clipline.log"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bridge.echo_window(), Duration::ZERO);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/clipline.log")));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.general.max_payload_bytes, 52_428_800);
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("nested/clipline.toml"));

        let config = storage.load().unwrap();

        assert_eq!(config, Config::default());
        assert!(storage.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("clipline.toml"));

        let mut config = Config::default();
        config.general.max_payload_bytes = 1024;
        config.logging.level = "debug".to_string();
        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipline.toml");
        fs::write(&path, "[general]\nmax_payload_bytes = \"lots\"\n").unwrap();

        assert!(TomlConfigStorage::new(path).load().is_err());
    }
}

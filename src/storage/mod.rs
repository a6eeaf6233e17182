pub mod config;

use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use config::{BridgeConfig, Config, ConfigStorage, GeneralConfig, LoggingConfig, TomlConfigStorage};

/// Ensure the XDG config directory exists and return it
///
/// XDG Base Directory Specification:
/// - Config: $XDG_CONFIG_HOME/clipline (default: ~/.config/clipline)
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("clipline")
    } else {
        let home = env::var("HOME").context("HOME environment variable not set")?;
        PathBuf::from(home).join(".config/clipline")
    };

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

    log::debug!("Config directory: {:?}", config_dir);

    Ok(config_dir)
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(ensure_config_dir()?.join("clipline.toml"))
}

/// Configuration together with where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    /// The file did not exist and was written from the built-in defaults
    pub created: bool,
}

/// Load the configuration, creating the default file when none exists
///
/// An explicitly named file must already exist. Runs before logging is
/// set up, so callers report `created` themselves.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file {:?} does not exist", path);
            }
            path.to_path_buf()
        }
        None => default_config_path()?,
    };

    let storage = TomlConfigStorage::new(path);
    let created = !storage.path().exists();
    let config = storage.load()?;

    Ok(LoadedConfig {
        config,
        path: storage.path().clone(),
        created,
    })
}

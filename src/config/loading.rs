//! Locating and reading the configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::CONFIG_FILE_NAME;
use crate::common::utils::private_path;

/// Configuration file given on the command line, set once at startup.
static CONFIG_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Override the configuration file location for the current process.
///
/// Can only be called once, before the first [`load`].
pub fn set_config_path(path: Option<PathBuf>) -> Result<()> {
    CONFIG_PATH
        .set(path)
        .map_err(|_| anyhow::anyhow!("Configuration path already set"))
}

/// `--config` if given, otherwise `$XDG_CONFIG_HOME/lamplighter/lamplighter.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH.get().and_then(|p| p.clone()) {
        return Ok(path);
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("lamplighter").join(CONFIG_FILE_NAME))
}

pub fn load() -> Result<Config> {
    let path = get_config_path()?;
    load_from_path(&path)
}

/// Read, parse and validate the configuration at `path`.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)
        .with_context(|| format!("Invalid configuration in {}", private_path(path)))?;

    Ok(config)
}

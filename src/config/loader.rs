// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::Result;

/// Load a configuration file from the given path.
///
/// This only performs TOML deserialization; unknown metric names in
/// `[run].metrics` are caught later, when the selection is resolved against
/// the registry.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load the configuration if the file exists, defaults otherwise.
///
/// The CLI surface is optional sugar over a programmatic API, so a missing
/// config file is not an error the way it is for a config-driven tool.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ConfigFile::default());
    }
    load_from_path(path)
}

/// Default config path: `Metricdag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Metricdag.toml")
}

//! Config file loading.
//!
//! The file is TOML with the same keys as [`CloudConfig`]; missing keys take
//! their defaults. `--base-url` / `REDBOX_URL` is applied on top.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use redbox_cloud::CloudConfig;
use tracing::debug;

/// Default location: `<config dir>/redbox/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "redbox").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads the config from `explicit`, or from the default path if it exists.
///
/// An explicit path that can't be read is an error; a missing default file
/// just means defaults.
pub fn load(explicit: Option<&Path>, base_url: Option<String>) -> Result<CloudConfig> {
    let mut config = match explicit {
        Some(path) => read(path)?,
        None => match default_path() {
            Some(path) if path.exists() => read(&path)?,
            _ => CloudConfig::default(),
        },
    };

    if let Some(url) = base_url {
        config.base_url = url;
    }
    config
        .validate()
        .context("Invalid configuration")?;
    Ok(config)
}

fn read(path: &Path) -> Result<CloudConfig> {
    debug!("reading config from {}", path.display());
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

//! Config file location, loading, and first-run creation.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use synapse_common::ConfigError;
use tracing::{info, warn};

use crate::schema::SynapseConfig;
use crate::validation;

use super::template::default_config_toml;

const APP_DIR: &str = "synapse";
const CONFIG_FILE: &str = "config.toml";

/// `<platform config dir>/synapse/config.toml`.
///
/// On macOS: `~/Library/Application Support/synapse/config.toml`
/// On Linux: `~/.config/synapse/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`.
///
/// Never overwrites: an existing file is an error.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_err = |what: &str, at: &Path, e: std::io::Error| {
        ConfigError::ParseError(format!("{what} {}: {e}", at.display()))
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err("cannot create", dir, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| io_err("cannot create", path, e))?;
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_err("cannot write", path, e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}

/// Load config from a specific TOML file path.
///
/// Missing fields fall back to serde defaults. A config that fails
/// validation is still returned, with a warning logged.
pub fn load_from_path(path: &Path) -> Result<SynapseConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: SynapseConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from `path`, creating a commented default file when it
/// does not exist yet.
pub fn load_or_create(path: &Path) -> Result<SynapseConfig, ConfigError> {
    match load_from_path(path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(path)?;
            Ok(SynapseConfig::default())
        }
        other => other,
    }
}

/// [`load_or_create`] at [`default_config_path`].
pub fn load_default() -> Result<SynapseConfig, ConfigError> {
    load_or_create(&default_config_path()?)
}

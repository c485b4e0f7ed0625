//! Where the config file lives, and first-run creation of it.

use std::path::{Path, PathBuf};

use pplx_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "pplx";
const CONFIG_FILE: &str = "config.toml";

/// `<config dir>/pplx/config.toml`, e.g. `~/.config/pplx/config.toml` on Linux.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_error = |what: &str, at: &Path, e: std::io::Error| {
        ConfigError::ParseError(format!("{what} {}: {e}", at.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error("cannot create", parent, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| io_error("cannot write", path, e))?;

    info!(path = %path.display(), "default config written");
    Ok(())
}

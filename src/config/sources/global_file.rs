//! Global file source: `$XDG_CONFIG_HOME/workbench/config.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;

/// Path of the per-user config file, if a home directory is known
pub fn path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("workbench").join("config.toml"));
        }
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config/workbench/config.toml"))
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(match path() {
        Some(path) => builder.add_source(File::from(path).required(false)),
        None => builder,
    })
}

//! Workspace file source: `<workspace>/workbench.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "workbench.toml";

pub fn path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(FILE_NAME)
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path(workspace_root)).required(false)))
}

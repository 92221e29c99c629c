//! Lowest layer of the merge: every field at its built-in default.

use crate::config::WorkbenchConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized defaults
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&WorkbenchConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

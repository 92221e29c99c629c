//! Environment variable source: WORKBENCH__ prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Add environment variable overlay to builder.
/// `WORKBENCH__GIT__DEFAULT_COMMIT_MESSAGE` sets `git.default_commit_message`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("WORKBENCH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}

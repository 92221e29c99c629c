//! ConfigLoader facade: merge the layers, then check the result.

use super::merge::service::MergeService;
use super::WorkbenchConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<WorkbenchConfig, ConfigError> {
        Self::validate(MergeService::load(workspace_root)?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<WorkbenchConfig, ConfigError> {
        Self::validate(MergeService::load_from_file(path)?)
    }

    /// An explicit file wins over the layered workspace lookup
    pub fn resolve(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<WorkbenchConfig, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }

    /// Reject values the stores and transports cannot work with
    pub fn validate(config: WorkbenchConfig) -> Result<WorkbenchConfig, ConfigError> {
        let invalid = |key: &str, reason: &str| {
            Err(ConfigError::Message(format!("{}: {}", key, reason)))
        };

        if !config.sync.project_root.starts_with('/') {
            return invalid("sync.project_root", "must be an absolute tree path");
        }
        if config.documents.history_limit == 0 {
            return invalid("documents.history_limit", "must be at least 1");
        }
        let base = config.git.api_base_url.as_str();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return invalid("git.api_base_url", "must be an http(s) URL");
        }
        if config.git.timeout_secs == 0 {
            return invalid("git.timeout_secs", "must be greater than zero");
        }
        Ok(config)
    }
}

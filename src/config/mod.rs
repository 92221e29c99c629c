//! Configuration
//!
//! `WorkbenchConfig` is layered by the `config` crate: built-in defaults, the
//! global file, the workspace file, then `WORKBENCH__SECTION__KEY` variables.

mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::sync::{ArchiveCompression, Visibility};
use serde::{Deserialize, Serialize};

/// Effective configuration for one workbench
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Clean documents beyond this count are evicted, least recently used first
    #[serde(default = "default_max_open_documents")]
    pub max_open_documents: usize,

    /// Saved versions kept per document
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_max_open_documents() -> usize {
    64
}

fn default_history_limit() -> usize {
    20
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_open_documents: default_max_open_documents(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Overlay unsaved buffers when syncing to a directory
    #[serde(default = "default_true")]
    pub include_unsaved_buffers: bool,

    /// Tree path that exports treat as their root
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Entry names skipped when loading a workspace from disk
    #[serde(default = "default_ignore_names")]
    pub ignore_names: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_project_root() -> String {
    "/".to_string()
}

fn default_ignore_names() -> Vec<String> {
    [".git", "node_modules", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include_unsaved_buffers: default_true(),
            project_root: default_project_root(),
            ignore_names: default_ignore_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Stem of exported archive names
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default)]
    pub compression: ArchiveCompression,
}

fn default_project_name() -> String {
    "project".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            compression: ArchiveCompression::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,

    /// Visibility of repositories created by a first push
    #[serde(default)]
    pub default_visibility: Visibility,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for the remote host
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_commit_message() -> String {
    "Initial commit".to_string()
}

fn default_user_agent() -> String {
    format!("workbench/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            default_commit_message: default_commit_message(),
            default_visibility: Visibility::default(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

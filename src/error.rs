//! Error types
//!
//! One enum per layer. Tree and document errors are returned to the immediate
//! caller; sync errors are returned as operation results. `ApiError` wraps all
//! of them for the configuration, logging and CLI edges.

use crate::sync::SyncKind;
use thiserror::Error;

/// File Tree errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Path {path} is already a {existing}")]
    KindConflict { path: String, existing: &'static str },

    #[error("File is locked: {0}")]
    FileLocked(String),
}

/// Document Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("No document for path: {0}")]
    PathNotFound(String),

    #[error("Save rejected, {0} no longer exists in the file tree")]
    SaveConflict(String),

    #[error("File is locked: {0}")]
    FileLocked(String),

    #[error("Binary document is read-only: {0}")]
    BinaryDocument(String),

    #[error("No saved version {index} for {path}")]
    VersionNotFound { path: String, index: usize },

    #[error("File tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Sync Coordinator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Another operation is in progress: {in_flight}")]
    Busy { in_flight: SyncKind },

    #[error("Directory sync incomplete: {succeeded} written, {failed} failed (first error: {first_error})")]
    PartialSyncFailure {
        succeeded: usize,
        failed: usize,
        first_error: String,
    },

    #[error("Authentication rejected: {0}")]
    AuthenticationFailure(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Repository conflict: {0}")]
    RepositoryConflict(String),

    #[error("Archive build failed: {0}")]
    Archive(String),

    #[error("Remote rejected request: {0}")]
    Transport(String),

    #[error("Target rejected {path}: {reason}")]
    Target { path: String, reason: String },
}

/// Crate-level error for configuration, logging and tooling
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

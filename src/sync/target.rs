//! Collaborator contracts for the three export operations.

use crate::error::SyncError;
use crate::sync::snapshot::ArchiveEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination of a directory sync.
///
/// Paths are relative to the target root, `/`-delimited, without a leading
/// slash. Writes overwrite existing content.
#[async_trait]
pub trait DirectoryTarget: Send + Sync {
    async fn create_directory(&self, relative: &str) -> Result<(), SyncError>;

    async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), SyncError>;
}

/// Serializes entries into an archive payload
pub trait ArchiveBuilder: Send + Sync {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, SyncError>;
}

/// Remote repository host
#[async_trait]
pub trait GitTransport: Send + Sync {
    /// Look up the repository, creating it when absent
    async fn ensure_repo(
        &self,
        name: &str,
        visibility: Visibility,
        credentials: &GitCredentials,
    ) -> Result<RepoHandle, SyncError>;

    /// Replace the branch content with `entries` in one commit; returns the repository URL
    async fn commit_and_push(
        &self,
        repo: &RepoHandle,
        message: &str,
        entries: &[ArchiveEntry],
        credentials: &GitCredentials,
    ) -> Result<String, SyncError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Username and access token for the remote host
#[derive(Clone, PartialEq, Eq)]
pub struct GitCredentials {
    pub username: String,
    pub token: String,
}

impl GitCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.token.trim().is_empty()
    }
}

impl fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Repository resolved by `ensure_repo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHandle {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub html_url: String,
}

impl RepoHandle {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

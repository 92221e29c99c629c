//! Sync Coordinator: directory sync, archive export and git push behind one slot.

use crate::config::WorkbenchConfig;
use crate::error::SyncError;
use crate::events::{EventBus, WorkbenchEvent};
use crate::sync::archive::archive_file_name;
use crate::sync::operation::{OperationGuard, OperationSlot, SyncKind, SyncOperation};
use crate::sync::snapshot::{ArchiveEntry, BufferPolicy, Snapshot, SnapshotSource};
use crate::sync::target::{
    ArchiveBuilder, DirectoryTarget, GitCredentials, GitTransport, RepoHandle, Visibility,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings the coordinator reads from [`WorkbenchConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub project_root: String,
    pub include_unsaved_buffers: bool,
    pub project_name: String,
    pub default_commit_message: String,
    pub default_visibility: Visibility,
}

impl From<&WorkbenchConfig> for SyncSettings {
    fn from(config: &WorkbenchConfig) -> Self {
        Self {
            project_root: config.sync.project_root.clone(),
            include_unsaved_buffers: config.sync.include_unsaved_buffers,
            project_name: config.archive.project_name.clone(),
            default_commit_message: config.git.default_commit_message.clone(),
            default_visibility: config.git.default_visibility,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&WorkbenchConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectorySyncReport {
    pub files_written: usize,
    pub directories_created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct PushRequest {
    pub repo_name: String,
    /// Falls back to the configured default message
    pub commit_message: Option<String>,
    pub credentials: GitCredentials,
    /// Only consulted by the first push, which creates the repository
    pub visibility: Option<Visibility>,
}

impl PushRequest {
    pub fn new(repo_name: impl Into<String>, credentials: GitCredentials) -> Self {
        Self {
            repo_name: repo_name.into(),
            commit_message: None,
            credentials,
            visibility: None,
        }
    }
}

/// Repository recorded by the first successful push
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedRemote {
    pub repo: RepoHandle,
    pub url: String,
    pub linked_at: DateTime<Utc>,
}

pub struct SyncCoordinator {
    slot: OperationSlot,
    source: Arc<dyn SnapshotSource>,
    archive: Arc<dyn ArchiveBuilder>,
    transport: Arc<dyn GitTransport>,
    settings: SyncSettings,
    events: EventBus,
    linked_remote: Mutex<Option<LinkedRemote>>,
}

impl SyncCoordinator {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        archive: Arc<dyn ArchiveBuilder>,
        transport: Arc<dyn GitTransport>,
        settings: SyncSettings,
        events: EventBus,
    ) -> Self {
        Self {
            slot: OperationSlot::new(),
            source,
            archive,
            transport,
            settings,
            events,
            linked_remote: Mutex::new(None),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn current(&self) -> SyncOperation {
        self.slot.current()
    }

    pub fn linked_remote(&self) -> Option<LinkedRemote> {
        self.linked_remote.lock().clone()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Write every folder and file of a snapshot into `target`.
    ///
    /// Best effort: a rejected write does not stop the remaining ones, and
    /// nothing already written is rolled back.
    pub async fn sync_to_directory(
        &self,
        target: &dyn DirectoryTarget,
    ) -> Result<DirectorySyncReport, SyncError> {
        let guard = self.begin(SyncKind::DirectorySync)?;
        let policy = if self.settings.include_unsaved_buffers {
            BufferPolicy::IncludeUnsaved
        } else {
            BufferPolicy::SavedOnly
        };
        let snapshot = self.source.snapshot(policy);
        let result = self.write_directory(&snapshot, target).await;
        let message = match &result {
            Ok(report) => format!("{} files written", report.files_written),
            Err(e) => e.to_string(),
        };
        self.finish(guard, result.is_ok(), message, Vec::new());
        result
    }

    async fn write_directory(
        &self,
        snapshot: &Snapshot,
        target: &dyn DirectoryTarget,
    ) -> Result<DirectorySyncReport, SyncError> {
        let root = &self.settings.project_root;
        let mut failed_dirs: Vec<(String, String)> = Vec::new();
        let mut first_error: Option<String> = None;
        let mut directories_created = 0;

        for dir in snapshot.directories(root) {
            let inherited = failed_dirs
                .iter()
                .find(|(failed, _)| is_within(&dir, failed))
                .map(|(_, err)| err.clone());
            if let Some(err) = inherited {
                failed_dirs.push((dir, err));
                continue;
            }
            match target.create_directory(&dir).await {
                Ok(()) => directories_created += 1,
                Err(e) => {
                    warn!(path = %dir, error = %e, "Directory rejected by target");
                    let err = e.to_string();
                    first_error.get_or_insert_with(|| err.clone());
                    failed_dirs.push((dir, err));
                }
            }
        }

        let entries = snapshot.entries(root);
        let mut files_written = 0;
        let mut files_failed = 0;
        for entry in &entries {
            let ArchiveEntry::File { path, bytes, .. } = entry else {
                continue;
            };
            let parent = path.rsplit_once('/').map(|(parent, _)| parent);
            let blocked = parent.and_then(|parent| {
                failed_dirs
                    .iter()
                    .find(|(failed, _)| failed == parent)
                    .map(|(_, err)| err.clone())
            });
            if let Some(err) = blocked {
                debug!(path = %path, "Skipping file below failed directory");
                files_failed += 1;
                first_error.get_or_insert(err);
                continue;
            }
            match target.write(path, bytes).await {
                Ok(()) => files_written += 1,
                Err(e) => {
                    warn!(path = %path, error = %e, "File rejected by target");
                    files_failed += 1;
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        // A failed branch holding no files still counts once, at its deepest folder
        let empty_failures = failed_dirs
            .iter()
            .filter(|(dir, _)| {
                let has_files = entries.iter().any(|e| {
                    matches!(e, ArchiveEntry::File { .. }) && is_within(e.path(), dir)
                });
                let has_failed_child = failed_dirs
                    .iter()
                    .any(|(other, _)| other != dir && is_within(other, dir));
                !has_files && !has_failed_child
            })
            .count();
        let failed = files_failed + empty_failures;

        match first_error {
            Some(first_error) if failed > 0 => Err(SyncError::PartialSyncFailure {
                succeeded: files_written,
                failed,
                first_error,
            }),
            _ => Ok(DirectorySyncReport {
                files_written,
                directories_created,
            }),
        }
    }

    /// Build an archive of the saved tree content
    pub async fn export_archive(&self) -> Result<ArchiveExport, SyncError> {
        let guard = self.begin(SyncKind::ArchiveExport)?;
        let result = self.build_archive().await;
        let message = match &result {
            Ok(export) => export.file_name.clone(),
            Err(e) => e.to_string(),
        };
        self.finish(guard, result.is_ok(), message, Vec::new());
        result
    }

    async fn build_archive(&self) -> Result<ArchiveExport, SyncError> {
        let snapshot = self.source.snapshot(BufferPolicy::SavedOnly);
        let entries = snapshot.entries(&self.settings.project_root);
        let entry_count = entries.len();
        let builder = Arc::clone(&self.archive);
        let bytes = tokio::task::spawn_blocking(move || builder.build(&entries))
            .await
            .map_err(|e| SyncError::Archive(format!("archive task failed: {}", e)))??;
        let file_name = archive_file_name(&self.settings.project_name, snapshot.taken_at());
        info!(file = %file_name, entries = entry_count, bytes = bytes.len(), "Archive built");
        Ok(ArchiveExport {
            file_name,
            bytes,
            entry_count,
        })
    }

    /// Commit the saved tree content to the remote and return its URL
    pub async fn push_to_remote(&self, request: PushRequest) -> Result<String, SyncError> {
        let guard = self.begin(SyncKind::GitPush)?;
        let result = self.push(request).await;
        let (message, extra) = match &result {
            Ok((url, newly_linked)) => {
                let extra = if *newly_linked {
                    vec![WorkbenchEvent::RemoteLinked { url: url.clone() }]
                } else {
                    Vec::new()
                };
                (url.clone(), extra)
            }
            Err(e) => (e.to_string(), Vec::new()),
        };
        self.finish(guard, result.is_ok(), message, extra);
        result.map(|(url, _)| url)
    }

    async fn push(&self, request: PushRequest) -> Result<(String, bool), SyncError> {
        if request.credentials.is_blank() {
            return Err(SyncError::AuthenticationFailure(
                "username and token are required".to_string(),
            ));
        }

        let snapshot = self.source.snapshot(BufferPolicy::SavedOnly);
        let entries = snapshot.entries(&self.settings.project_root);

        let linked = self.linked_remote();
        let repo = match &linked {
            Some(linked) => {
                if linked.repo.name != request.repo_name {
                    warn!(
                        linked = %linked.repo.full_name(),
                        requested = %request.repo_name,
                        "Project is already linked; pushing to the linked repository"
                    );
                }
                linked.repo.clone()
            }
            None => {
                if request.repo_name.trim().is_empty() {
                    return Err(SyncError::Transport("repository name is required".to_string()));
                }
                let visibility = request
                    .visibility
                    .unwrap_or(self.settings.default_visibility);
                self.transport
                    .ensure_repo(request.repo_name.trim(), visibility, &request.credentials)
                    .await?
            }
        };

        let message = request
            .commit_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_commit_message.as_str())
            .to_string();
        let url = self
            .transport
            .commit_and_push(&repo, &message, &entries, &request.credentials)
            .await?;

        let newly_linked = linked.is_none();
        if newly_linked {
            info!(repo = %repo.full_name(), url = %url, "Linked remote repository");
            *self.linked_remote.lock() = Some(LinkedRemote {
                repo,
                url: url.clone(),
                linked_at: Utc::now(),
            });
        }
        Ok((url, newly_linked))
    }

    fn begin(&self, kind: SyncKind) -> Result<OperationGuard, SyncError> {
        let guard = self.slot.try_begin(kind).map_err(|e| {
            warn!(requested = %kind, error = %e, "Sync operation rejected");
            e
        })?;
        info!(kind = %kind, "Sync operation started");
        self.events.emit(&WorkbenchEvent::SyncStarted { kind });
        Ok(guard)
    }

    /// Release the slot, then notify
    fn finish(
        &self,
        guard: OperationGuard,
        success: bool,
        message: String,
        extra: Vec<WorkbenchEvent>,
    ) {
        let kind = guard.kind();
        drop(guard);
        if success {
            info!(kind = %kind, result = %message, "Sync operation finished");
        } else {
            warn!(kind = %kind, error = %message, "Sync operation failed");
        }
        self.events.emit_all(&extra);
        self.events.emit(&WorkbenchEvent::SyncFinished {
            kind,
            success,
            message,
        });
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("current", &self.slot.current())
            .field("settings", &self.settings)
            .field("linked_remote", &self.linked_remote())
            .finish()
    }
}

/// `path` equals `dir` or lies below it
fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || (path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/')
}

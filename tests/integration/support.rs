//! In-memory collaborators shared by the scenario tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Notify;
use workbench::config::WorkbenchConfig;
use workbench::sync::{
    ArchiveEntry, DirectoryTarget, GitCredentials, GitTransport, RepoHandle, Visibility,
    ZipArchiveBuilder,
};
use workbench::tree::{FileNode, ProjectPath, SetMode};
use workbench::{SyncError, Workbench, WorkbenchEvent};

pub fn p(raw: &str) -> ProjectPath {
    ProjectPath::parse(raw).unwrap()
}

pub fn workbench_with(transport: Arc<FakeTransport>) -> Workbench {
    Workbench::with_collaborators(
        WorkbenchConfig::default(),
        Arc::new(ZipArchiveBuilder::default()),
        transport,
    )
}

pub fn workbench() -> Workbench {
    workbench_with(Arc::new(FakeTransport::default()))
}

/// Workbench preloaded with text files
pub fn workbench_with_files(files: &[(&str, &str)]) -> Workbench {
    let wb = workbench();
    load(&wb, files);
    wb
}

pub fn load(wb: &Workbench, files: &[(&str, &str)]) {
    let nodes = files
        .iter()
        .map(|(path, content)| FileNode::file(p(path), *content))
        .collect();
    wb.set_files(nodes, SetMode::Replace).unwrap();
}

/// Collects every event a workbench emits
pub fn record_events(wb: &Workbench) -> Arc<Mutex<Vec<WorkbenchEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    wb.subscribe(move |event| sink.lock().push(event.clone()));
    events
}

/// Directory target that keeps writes in memory and rejects chosen paths
#[derive(Default)]
pub struct MemoryTarget {
    pub directories: Mutex<BTreeSet<String>>,
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub reject_writes: BTreeSet<String>,
    pub reject_directories: BTreeSet<String>,
}

impl MemoryTarget {
    pub fn rejecting_writes(paths: &[&str]) -> Self {
        Self {
            reject_writes: paths.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn rejecting_directories(paths: &[&str]) -> Self {
        Self {
            reject_directories: paths.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait]
impl DirectoryTarget for MemoryTarget {
    async fn create_directory(&self, relative: &str) -> Result<(), SyncError> {
        if self.reject_directories.contains(relative) {
            return Err(SyncError::Target {
                path: relative.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        self.directories.lock().insert(relative.to_string());
        Ok(())
    }

    async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), SyncError> {
        if self.reject_writes.contains(relative) {
            return Err(SyncError::Target {
                path: relative.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        self.files.lock().insert(relative.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// One recorded `commit_and_push` call
#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub repo: RepoHandle,
    pub message: String,
    pub entries: Vec<ArchiveEntry>,
}

/// Git host fake; optionally parks inside `commit_and_push` until released
#[derive(Default)]
pub struct FakeTransport {
    pub ensure_calls: Mutex<Vec<(String, Visibility)>>,
    pub pushes: Mutex<Vec<RecordedPush>>,
    pub fail_with: Mutex<Option<SyncError>>,
    pub gate: Option<PushGate>,
}

pub struct PushGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeTransport {
    pub fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let transport = Self {
            gate: Some(PushGate {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
            ..Self::default()
        };
        (transport, entered, release)
    }

    pub fn failing(error: SyncError) -> Self {
        Self {
            fail_with: Mutex::new(Some(error)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GitTransport for FakeTransport {
    async fn ensure_repo(
        &self,
        name: &str,
        visibility: Visibility,
        credentials: &GitCredentials,
    ) -> Result<RepoHandle, SyncError> {
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        self.ensure_calls.lock().push((name.to_string(), visibility));
        Ok(RepoHandle {
            owner: credentials.username.clone(),
            name: name.to_string(),
            default_branch: "main".to_string(),
            html_url: format!("https://git.example/{}", name),
        })
    }

    async fn commit_and_push(
        &self,
        repo: &RepoHandle,
        message: &str,
        entries: &[ArchiveEntry],
        _credentials: &GitCredentials,
    ) -> Result<String, SyncError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.pushes.lock().push(RecordedPush {
            repo: repo.clone(),
            message: message.to_string(),
            entries: entries.to_vec(),
        });
        Ok(repo.html_url.clone())
    }
}

//! Workbench context
//!
//! Owns the File Tree, the Document Store and the selection, and wires them
//! together: every tree mutation is followed by the documents, then the
//! selection, then the auto-preview rule. Events are collected while the
//! state lock is held and delivered after it is released.

use crate::config::WorkbenchConfig;
use crate::document::{
    DocumentStore, DocumentView, HistoryVersion, SaveOutcome, ScrollPosition,
};
use crate::error::{ApiError, DocumentError, SyncError, TreeError};
use crate::events::{EventBus, SubscriptionId, WorkbenchEvent};
use crate::selection::{PreviewTarget, SelectionState, SelectionStore, View};
use crate::sync::{
    ArchiveBuilder, ArchiveExport, BufferPolicy, DirectorySyncReport, DirectoryTarget,
    GitHubTransport, GitTransport, LinkedRemote, PushRequest, Snapshot, SnapshotSource,
    SyncCoordinator, SyncOperation, SyncSettings, ZipArchiveBuilder,
};
use crate::tree::{FileChange, FileNode, FileTreeStore, ProjectPath, SetMode, TreeChange};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

struct WorkbenchState {
    tree: FileTreeStore,
    documents: DocumentStore,
    selection: SelectionStore,
}

impl WorkbenchState {
    /// Propagate a tree change to documents and selection
    fn follow_tree(&mut self, change: &TreeChange, events: &mut Vec<WorkbenchEvent>) {
        if !change.is_empty() {
            events.push(WorkbenchEvent::files_changed(change));

            let was_unsaved = self.documents.unsaved().clone();
            let sync = self.documents.sync_with_tree(change, &self.tree);
            for path in sync.retired {
                events.push(WorkbenchEvent::DocumentRetired { path });
            }
            for path in &sync.refreshed {
                events.push(WorkbenchEvent::DocumentRefreshed { path: path.clone() });
            }
            for path in sync.refreshed.iter().chain(sync.rebased.iter()) {
                self.dirty_event(path, was_unsaved.contains(path), events);
            }

            if let Some(cleared) = self.selection.follow_tree(change) {
                debug!(path = %cleared, "Selected file removed");
                events.push(WorkbenchEvent::SelectionChanged { selected: None });
            }
        }
        self.apply_preview_rule(events);
    }

    fn apply_preview_rule(&mut self, events: &mut Vec<WorkbenchEvent>) {
        if self.selection.apply_preview_rule() {
            events.push(WorkbenchEvent::ViewChanged {
                view: self.selection.state().current_view,
            });
        }
    }

    /// Open a document, then evict clean documents beyond `max_open`.
    ///
    /// The opened document and the selected one are never evicted.
    fn open(
        &mut self,
        path: &ProjectPath,
        max_open: usize,
        events: &mut Vec<WorkbenchEvent>,
    ) -> Result<DocumentView, DocumentError> {
        let was_open = self.documents.is_open(path.as_str());
        let view = {
            let state = self.documents.open(path, &self.tree)?;
            DocumentView::from_state(path, state)
        };
        if !was_open {
            events.push(WorkbenchEvent::DocumentOpened { path: path.clone() });
        }

        let mut protected = vec![path];
        if let Some(selected) = self.selection.selected_file() {
            protected.push(selected);
        }
        for evicted in self.documents.evict(max_open, &protected) {
            events.push(WorkbenchEvent::DocumentEvicted { path: evicted });
        }
        Ok(view)
    }

    fn dirty_event(&self, path: &ProjectPath, was_dirty: bool, events: &mut Vec<WorkbenchEvent>) {
        let dirty = self.documents.is_dirty(path.as_str());
        if dirty != was_dirty {
            events.push(WorkbenchEvent::DirtyChanged {
                path: path.clone(),
                dirty,
            });
        }
    }

    fn save(
        &mut self,
        path: &ProjectPath,
        events: &mut Vec<WorkbenchEvent>,
    ) -> Result<SaveOutcome, DocumentError> {
        let outcome = self.documents.save(path, &mut self.tree)?;
        if let SaveOutcome::Saved(change) = &outcome {
            self.follow_tree(change, events);
            events.push(WorkbenchEvent::DocumentSaved { path: path.clone() });
            events.push(WorkbenchEvent::DirtyChanged {
                path: path.clone(),
                dirty: false,
            });
        }
        Ok(outcome)
    }
}

/// Shared handle the coordinator snapshots from
#[derive(Clone)]
struct SharedState(Arc<RwLock<WorkbenchState>>);

impl SnapshotSource for SharedState {
    fn snapshot(&self, policy: BufferPolicy) -> Snapshot {
        let state = self.0.read();
        match policy {
            BufferPolicy::IncludeUnsaved => Snapshot::capture(&state.tree, Some(&state.documents)),
            BufferPolicy::SavedOnly => Snapshot::capture(&state.tree, None),
        }
    }
}

/// One project open in the workbench
pub struct Workbench {
    state: SharedState,
    events: EventBus,
    sync: SyncCoordinator,
    config: WorkbenchConfig,
}

impl Workbench {
    /// Workbench with the ZIP builder and the GitHub transport
    pub fn new(config: WorkbenchConfig) -> Result<Self, ApiError> {
        let archive = Arc::new(ZipArchiveBuilder::new(config.archive.compression));
        let transport = Arc::new(GitHubTransport::new(
            config.git.api_base_url.clone(),
            &config.git.user_agent,
            Duration::from_secs(config.git.timeout_secs),
        )?);
        Ok(Self::with_collaborators(config, archive, transport))
    }

    /// Workbench with caller-supplied export collaborators
    pub fn with_collaborators(
        config: WorkbenchConfig,
        archive: Arc<dyn ArchiveBuilder>,
        transport: Arc<dyn GitTransport>,
    ) -> Self {
        let state = SharedState(Arc::new(RwLock::new(WorkbenchState {
            tree: FileTreeStore::new(),
            documents: DocumentStore::new(config.documents.history_limit),
            selection: SelectionStore::new(),
        })));
        let events = EventBus::new();
        let sync = SyncCoordinator::new(
            Arc::new(state.clone()),
            archive,
            transport,
            SyncSettings::from(&config),
            events.clone(),
        );
        Self {
            state,
            events,
            sync,
            config,
        }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Run a mutation under the write lock, then deliver its events
    fn mutate<T>(&self, f: impl FnOnce(&mut WorkbenchState, &mut Vec<WorkbenchEvent>) -> T) -> T {
        let mut events = Vec::new();
        let out = {
            let mut state = self.state.0.write();
            f(&mut state, &mut events)
        };
        self.events.emit_all(&events);
        out
    }

    fn read<T>(&self, f: impl FnOnce(&WorkbenchState) -> T) -> T {
        f(&self.state.0.read())
    }

    fn selected_or_err(&self) -> Result<ProjectPath, DocumentError> {
        self.read(|s| s.selection.selected_file().cloned())
            .ok_or_else(|| DocumentError::PathNotFound("no file selected".to_string()))
    }

    // File Tree

    /// Replace or merge a batch of nodes
    pub fn set_files(&self, nodes: Vec<FileNode>, mode: SetMode) -> Result<TreeChange, TreeError> {
        self.mutate(|state, events| {
            let change = state.tree.set_files(nodes, mode)?;
            state.follow_tree(&change, events);
            Ok(change)
        })
    }

    /// Apply one write or delete from the action runner
    pub fn apply_file_change(
        &self,
        path: &ProjectPath,
        change: FileChange,
    ) -> Result<TreeChange, TreeError> {
        self.mutate(|state, events| {
            let change = state.tree.apply_change(path, change)?;
            state.follow_tree(&change, events);
            Ok(change)
        })
    }

    pub fn create_folder(&self, path: &ProjectPath) -> Result<TreeChange, TreeError> {
        self.mutate(|state, events| {
            let change = state.tree.create_folder(path)?;
            state.follow_tree(&change, events);
            Ok(change)
        })
    }

    pub fn set_locked(&self, path: &ProjectPath, locked: bool) -> Result<(), TreeError> {
        self.mutate(|state, _| state.tree.set_locked(path, locked))
    }

    pub fn files(&self) -> Vec<FileNode> {
        self.read(|s| s.tree.iter().cloned().collect())
    }

    pub fn file(&self, path: &str) -> Option<FileNode> {
        self.read(|s| s.tree.get_file(path).cloned())
    }

    // Documents

    /// Open (or re-open) the document for a file
    pub fn open(&self, path: &ProjectPath) -> Result<DocumentView, DocumentError> {
        let max_open = self.config.documents.max_open_documents;
        self.mutate(|state, events| state.open(path, max_open, events))
    }

    pub fn set_content(&self, path: &ProjectPath, value: &str) -> Result<(), DocumentError> {
        self.mutate(|state, events| {
            let was_dirty = state.documents.is_dirty(path.as_str());
            state.documents.set_content(path, value)?;
            state.dirty_event(path, was_dirty, events);
            Ok(())
        })
    }

    pub fn set_scroll_position(
        &self,
        path: &ProjectPath,
        scroll: ScrollPosition,
    ) -> Result<(), DocumentError> {
        self.mutate(|state, _| state.documents.set_scroll_position(path, scroll))
    }

    pub fn save(&self, path: &ProjectPath) -> Result<SaveOutcome, DocumentError> {
        self.mutate(|state, events| state.save(path, events))
            .map_err(|e| {
                warn!(path = %path, error = %e, "Save failed");
                e
            })
    }

    /// Discard unsaved edits; returns whether anything changed
    pub fn reset(&self, path: &ProjectPath) -> bool {
        self.mutate(|state, events| {
            let was_dirty = state.documents.is_dirty(path.as_str());
            let changed = state.documents.reset(path);
            state.dirty_event(path, was_dirty, events);
            changed
        })
    }

    /// Load a saved version into the buffer as an unsaved edit
    pub fn restore_version(&self, path: &ProjectPath, index: usize) -> Result<(), DocumentError> {
        self.mutate(|state, events| {
            let was_dirty = state.documents.is_dirty(path.as_str());
            state.documents.restore_version(path, index)?;
            state.dirty_event(path, was_dirty, events);
            Ok(())
        })
    }

    /// Save every dirty document; returns the ones that failed
    pub fn save_all(&self) -> Vec<(ProjectPath, DocumentError)> {
        let failures = self.mutate(|state, events| {
            let dirty: Vec<ProjectPath> = state.documents.unsaved().iter().cloned().collect();
            dirty
                .into_iter()
                .filter_map(|path| match state.save(&path, events) {
                    Ok(_) => None,
                    Err(e) => Some((path, e)),
                })
                .collect::<Vec<_>>()
        });
        for (path, error) in &failures {
            warn!(path = %path, error = %error, "Save failed");
        }
        failures
    }

    pub fn set_current_content(&self, value: &str) -> Result<(), DocumentError> {
        let path = self.selected_or_err()?;
        self.set_content(&path, value)
    }

    pub fn set_current_scroll_position(&self, scroll: ScrollPosition) -> Result<(), DocumentError> {
        let path = self.selected_or_err()?;
        self.set_scroll_position(&path, scroll)
    }

    pub fn save_current(&self) -> Result<SaveOutcome, DocumentError> {
        let path = self.selected_or_err()?;
        self.save(&path)
    }

    pub fn reset_current(&self) -> Result<bool, DocumentError> {
        let path = self.selected_or_err()?;
        Ok(self.reset(&path))
    }

    /// Document of the selected file, if it is open
    pub fn current_document(&self) -> Option<DocumentView> {
        self.read(|s| {
            let path = s.selection.selected_file()?;
            s.documents
                .get(path.as_str())
                .map(|state| DocumentView::from_state(path, state))
        })
    }

    pub fn document(&self, path: &ProjectPath) -> Option<DocumentView> {
        self.read(|s| {
            s.documents
                .get(path.as_str())
                .map(|state| DocumentView::from_state(path, state))
        })
    }

    pub fn unsaved_paths(&self) -> Vec<ProjectPath> {
        self.read(|s| s.documents.unsaved().iter().cloned().collect())
    }

    pub fn history(&self, path: &ProjectPath) -> Vec<HistoryVersion> {
        self.read(|s| {
            s.documents
                .history(path.as_str())
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    // Selection & view

    /// Select a file (opening its document) or clear the selection
    pub fn select_file(&self, path: Option<ProjectPath>) -> Result<(), DocumentError> {
        let max_open = self.config.documents.max_open_documents;
        self.mutate(|state, events| {
            if let Some(path) = &path {
                state.open(path, max_open, events)?;
            }
            if state.selection.select(path.clone()) {
                events.push(WorkbenchEvent::SelectionChanged { selected: path });
            }
            Ok(())
        })
    }

    /// Select a file and bring the code view forward
    pub fn reveal_file(&self, path: &ProjectPath) -> Result<(), DocumentError> {
        self.select_file(Some(path.clone()))?;
        self.set_view(View::Code);
        Ok(())
    }

    pub fn set_view(&self, view: View) -> bool {
        self.mutate(|state, events| {
            let changed = state.selection.set_view(view);
            if changed {
                events.push(WorkbenchEvent::ViewChanged { view });
            }
            changed
        })
    }

    pub fn toggle_terminal(&self, visible: bool) -> bool {
        self.mutate(|state, events| {
            let changed = state.selection.toggle_terminal(visible);
            if changed {
                events.push(WorkbenchEvent::TerminalToggled { visible });
            }
            changed
        })
    }

    pub fn set_workbench_visible(&self, visible: bool) -> bool {
        self.mutate(|state, events| {
            let changed = state.selection.set_workbench_visible(visible);
            if changed {
                events.push(WorkbenchEvent::WorkbenchVisibilityChanged { visible });
            }
            changed
        })
    }

    pub fn add_preview(&self, target: PreviewTarget) -> bool {
        self.mutate(|state, events| {
            let changed = state.selection.add_preview(target);
            if changed {
                events.push(WorkbenchEvent::PreviewsChanged {
                    count: state.selection.previews().len(),
                });
            }
            state.apply_preview_rule(events);
            changed
        })
    }

    pub fn remove_preview(&self, port: u16) -> bool {
        self.mutate(|state, events| {
            let changed = state.selection.remove_preview(port);
            if changed {
                events.push(WorkbenchEvent::PreviewsChanged {
                    count: state.selection.previews().len(),
                });
            }
            state.apply_preview_rule(events);
            changed
        })
    }

    pub fn selection(&self) -> SelectionState {
        self.read(|s| s.selection.state().clone())
    }

    pub fn previews(&self) -> Vec<PreviewTarget> {
        self.read(|s| s.selection.previews())
    }

    // Sync

    pub async fn sync_to_directory(
        &self,
        target: &dyn DirectoryTarget,
    ) -> Result<DirectorySyncReport, SyncError> {
        self.sync.sync_to_directory(target).await
    }

    pub async fn export_archive(&self) -> Result<ArchiveExport, SyncError> {
        self.sync.export_archive().await
    }

    pub async fn push_to_remote(&self, request: PushRequest) -> Result<String, SyncError> {
        self.sync.push_to_remote(request).await
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_busy()
    }

    pub fn sync_operation(&self) -> SyncOperation {
        self.sync.current()
    }

    pub fn linked_remote(&self) -> Option<LinkedRemote> {
        self.sync.linked_remote()
    }

    // Events

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&WorkbenchEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Load a directory from disk, replacing the tree
    pub fn load_directory(&self, root: &std::path::Path) -> Result<TreeChange, ApiError> {
        let nodes = crate::tree::loader::load_directory(
            root,
            &self.config.sync.project_root,
            &self.config.sync.ignore_names,
        )?;
        let change = self.set_files(nodes, SetMode::Replace)?;
        info!(root = %root.display(), added = change.added.len(), "Loaded workspace");
        Ok(change)
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("files", &self.read(|s| s.tree.file_count()))
            .field("documents", &self.read(|s| s.documents.len()))
            .field("sync", &self.sync)
            .finish()
    }
}

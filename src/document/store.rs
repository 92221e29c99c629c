//! Document Store
//!
//! Editable views over File Tree entries. Documents are created lazily on
//! first open, hold at most one state per path, and keep the unsaved set in
//! step with every mutation.

use super::history::DocumentHistory;
use super::state::{DocumentState, ScrollPosition};
use crate::error::{DocumentError, TreeError};
use crate::tree::{FileNode, FileTreeStore, ProjectPath, TreeChange};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Result of a save call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Buffer written to the tree, baseline advanced
    Saved(TreeChange),
    /// Document was clean; nothing written
    Unchanged,
}

/// Documents touched while following a tree change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSync {
    pub retired: Vec<ProjectPath>,
    pub refreshed: Vec<ProjectPath>,
    /// Dirty documents whose baseline moved to new file content
    pub rebased: Vec<ProjectPath>,
}

impl DocumentSync {
    pub fn is_empty(&self) -> bool {
        self.retired.is_empty() && self.refreshed.is_empty() && self.rebased.is_empty()
    }
}

pub struct DocumentStore {
    documents: HashMap<ProjectPath, DocumentState>,
    unsaved: BTreeSet<ProjectPath>,
    history: HashMap<ProjectPath, DocumentHistory>,
    history_limit: usize,
    clock: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(20)
    }
}

impl DocumentStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            documents: HashMap::new(),
            unsaved: BTreeSet::new(),
            history: HashMap::new(),
            history_limit,
            clock: 0,
        }
    }

    /// Open a document, creating it from the file content on first use.
    ///
    /// Re-opening returns the existing state untouched, dirty or not.
    pub fn open(
        &mut self,
        path: &ProjectPath,
        tree: &FileTreeStore,
    ) -> Result<&DocumentState, DocumentError> {
        let touched = self.tick();
        if !self.documents.contains_key(path) {
            let entry = match tree.get_file(path.as_str()) {
                Some(FileNode::File(entry)) => entry,
                _ => return Err(DocumentError::PathNotFound(path.to_string())),
            };
            let content = entry.content.as_text().unwrap_or_default().to_string();
            debug!(path = %path, binary = entry.is_binary(), "Opened document");
            self.documents.insert(
                path.clone(),
                DocumentState::new(content, entry.is_binary(), touched),
            );
        }
        let state = self
            .documents
            .get_mut(path)
            .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;
        state.last_touched = touched;
        Ok(state)
    }

    /// Replace the buffer; the baseline is never touched
    pub fn set_content(&mut self, path: &ProjectPath, value: &str) -> Result<(), DocumentError> {
        let touched = self.tick();
        let state = self.state_mut(path)?;
        if state.is_binary {
            return Err(DocumentError::BinaryDocument(path.to_string()));
        }
        state.value = value.to_string();
        state.last_touched = touched;
        self.refresh_dirty(path);
        Ok(())
    }

    pub fn set_scroll_position(
        &mut self,
        path: &ProjectPath,
        scroll: ScrollPosition,
    ) -> Result<(), DocumentError> {
        self.state_mut(path)?.scroll = scroll;
        Ok(())
    }

    /// Write the buffer into the tree, then advance the baseline.
    ///
    /// On failure the document stays dirty.
    pub fn save(
        &mut self,
        path: &ProjectPath,
        tree: &mut FileTreeStore,
    ) -> Result<SaveOutcome, DocumentError> {
        let state = self
            .documents
            .get(path)
            .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;
        if !state.is_dirty() {
            return Ok(SaveOutcome::Unchanged);
        }

        let value = state.value.clone();
        let change = tree.write_file(path, &value).map_err(|e| match e {
            TreeError::PathNotFound(p) => DocumentError::SaveConflict(p),
            TreeError::FileLocked(p) => DocumentError::FileLocked(p),
            other => DocumentError::Tree(other),
        })?;

        if let Some(state) = self.documents.get_mut(path) {
            state.original_value = value.clone();
        }
        self.refresh_dirty(path);
        let limit = self.history_limit;
        self.history
            .entry(path.clone())
            .or_insert_with(|| DocumentHistory::new(limit))
            .record(&value);
        debug!(path = %path, bytes = value.len(), "Saved document");
        Ok(SaveOutcome::Saved(change))
    }

    /// Discard edits; returns whether the buffer changed
    pub fn reset(&mut self, path: &ProjectPath) -> bool {
        let changed = match self.documents.get_mut(path) {
            Some(state) if state.is_dirty() => {
                state.value = state.original_value.clone();
                true
            }
            _ => false,
        };
        self.refresh_dirty(path);
        changed
    }

    /// Load a saved version into the buffer as an edit
    pub fn restore_version(&mut self, path: &ProjectPath, index: usize) -> Result<(), DocumentError> {
        let content = self
            .history
            .get(path)
            .and_then(|h| h.get(index))
            .map(|v| v.content.clone())
            .ok_or_else(|| DocumentError::VersionNotFound {
                path: path.to_string(),
                index,
            })?;
        self.set_content(path, &content)
    }

    /// Follow a tree mutation: retire documents of removed paths and refresh
    /// clean documents whose file content changed. Dirty documents keep their
    /// buffer while the baseline moves to the new file content.
    pub fn sync_with_tree(&mut self, change: &TreeChange, tree: &FileTreeStore) -> DocumentSync {
        let mut sync = DocumentSync::default();

        for path in &change.removed {
            if self.documents.remove(path).is_some() {
                if self.unsaved.remove(path) {
                    warn!(path = %path, "Retired document with unsaved edits");
                }
                sync.retired.push(path.clone());
            }
            self.history.remove(path);
        }

        for path in change.modified.iter().chain(change.added.iter()) {
            let Some(state) = self.documents.get_mut(path) else {
                continue;
            };
            let Some(FileNode::File(entry)) = tree.get_file(path.as_str()) else {
                continue;
            };
            let text = entry.content.as_text().unwrap_or_default();
            if state.is_dirty() && !entry.is_binary() {
                if state.original_value != text {
                    debug!(path = %path, "Keeping unsaved edits over external change");
                    state.original_value = text.to_string();
                    sync.rebased.push(path.clone());
                }
                continue;
            }
            if state.is_dirty() {
                warn!(path = %path, "File became binary, dropping unsaved edits");
            }
            if state.original_value != text || state.is_binary != entry.is_binary() {
                state.original_value = text.to_string();
                state.value = text.to_string();
                state.is_binary = entry.is_binary();
                sync.refreshed.push(path.clone());
            }
        }

        let touched: Vec<ProjectPath> = sync
            .rebased
            .iter()
            .chain(sync.refreshed.iter())
            .cloned()
            .collect();
        for path in &touched {
            self.refresh_dirty(path);
        }
        sync
    }

    /// Evict least recently touched clean documents beyond `max_open`.
    ///
    /// Dirty documents and `protected` paths are never evicted. `max_open == 0`
    /// disables eviction.
    pub fn evict(&mut self, max_open: usize, protected: &[&ProjectPath]) -> Vec<ProjectPath> {
        if max_open == 0 || self.documents.len() <= max_open {
            return Vec::new();
        }
        let mut candidates: Vec<(u64, ProjectPath)> = self
            .documents
            .iter()
            .filter(|(path, state)| !state.is_dirty() && !protected.contains(path))
            .map(|(path, state)| (state.last_touched, path.clone()))
            .collect();
        candidates.sort();

        let excess = self.documents.len() - max_open;
        let evicted: Vec<ProjectPath> = candidates
            .into_iter()
            .take(excess)
            .map(|(_, path)| path)
            .collect();
        for path in &evicted {
            self.documents.remove(path);
        }
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "Evicted clean documents");
        }
        evicted
    }

    pub fn get(&self, path: &str) -> Option<&DocumentState> {
        self.documents.get(path)
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.documents.get(path).map(|d| d.is_dirty()).unwrap_or(false)
    }

    /// Paths whose document is dirty
    pub fn unsaved(&self) -> &BTreeSet<ProjectPath> {
        &self.unsaved
    }

    pub fn history(&self, path: &str) -> Option<&DocumentHistory> {
        self.history.get(path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectPath, &DocumentState)> {
        self.documents.iter()
    }

    fn state_mut(&mut self, path: &ProjectPath) -> Result<&mut DocumentState, DocumentError> {
        self.documents
            .get_mut(path)
            .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))
    }

    fn refresh_dirty(&mut self, path: &ProjectPath) {
        if self.is_dirty(path.as_str()) {
            self.unsaved.insert(path.clone());
        } else {
            self.unsaved.remove(path);
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

//! File Tree Store
//!
//! Authoritative snapshot of the project. Every mutation returns a
//! [`TreeChange`] describing exactly which paths were added, modified or
//! removed; unchanged paths never appear in it.

use super::node::{FileContent, FileEntry, FileNode};
use super::path::ProjectPath;
use crate::error::TreeError;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// How `set_files` combines the incoming nodes with the current tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Paths missing from the incoming set are removed
    Replace,
    /// Incoming nodes are upserted, everything else is kept
    Merge,
}

/// Push-based change from the action runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Write(FileContent),
    Delete,
}

/// Paths affected by one tree mutation, each list sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeChange {
    pub added: Vec<ProjectPath>,
    pub modified: Vec<ProjectPath>,
    pub removed: Vec<ProjectPath>,
}

impl TreeChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    fn diff(old: &BTreeMap<ProjectPath, FileNode>, new: &BTreeMap<ProjectPath, FileNode>) -> Self {
        let mut change = TreeChange::default();
        for (path, node) in new {
            match old.get(path) {
                None => change.added.push(path.clone()),
                Some(prev) if prev.is_folder() != node.is_folder() => {
                    change.removed.push(path.clone());
                    change.added.push(path.clone());
                }
                Some(prev) if prev != node => change.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in old.keys() {
            if !new.contains_key(path) {
                change.removed.push(path.clone());
            }
        }
        change.removed.sort();
        change
    }
}

/// Canonical path -> node mapping
#[derive(Debug, Clone, Default)]
pub struct FileTreeStore {
    nodes: BTreeMap<ProjectPath, FileNode>,
}

impl FileTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or merge the tree from a set of nodes.
    ///
    /// The batch is validated as a whole; on error the tree is left untouched.
    /// Locked files keep their node: incoming entries for them are ignored and
    /// `Replace` does not remove them.
    pub fn set_files(
        &mut self,
        nodes: impl IntoIterator<Item = FileNode>,
        mode: SetMode,
    ) -> Result<TreeChange, TreeError> {
        let mut staged = match mode {
            SetMode::Replace => BTreeMap::new(),
            SetMode::Merge => self.nodes.clone(),
        };

        for node in nodes {
            if self.is_locked(node.path().as_str()) {
                warn!(path = %node.path(), "Ignoring write to locked file");
                continue;
            }
            stage_insert(&mut staged, node)?;
        }
        // Locked files survive both modes untouched
        for node in self.nodes.values().filter(|n| is_locked_file(n)) {
            stage_insert(&mut staged, node.clone())?;
        }

        let change = TreeChange::diff(&self.nodes, &staged);
        self.nodes = staged;
        debug!(
            added = change.added.len(),
            modified = change.modified.len(),
            removed = change.removed.len(),
            "File tree updated"
        );
        Ok(change)
    }

    /// Apply one write or delete pushed by the action runner
    pub fn apply_change(
        &mut self,
        path: &ProjectPath,
        change: FileChange,
    ) -> Result<TreeChange, TreeError> {
        match change {
            FileChange::Write(content) => self.upsert_file(path, content),
            FileChange::Delete => {
                if self.is_locked(path.as_str()) {
                    return Err(TreeError::FileLocked(path.to_string()));
                }
                self.remove(path)
            }
        }
    }

    /// Create a folder (and any missing ancestors)
    pub fn create_folder(&mut self, path: &ProjectPath) -> Result<TreeChange, TreeError> {
        let mut staged = self.nodes.clone();
        stage_insert(&mut staged, FileNode::folder(path.clone()))?;
        let change = TreeChange::diff(&self.nodes, &staged);
        self.nodes = staged;
        Ok(change)
    }

    /// Overwrite the text of an existing file; used by document saves
    pub fn write_file(&mut self, path: &ProjectPath, text: &str) -> Result<TreeChange, TreeError> {
        match self.nodes.get_mut(path) {
            Some(FileNode::File(entry)) => {
                if entry.locked {
                    return Err(TreeError::FileLocked(path.to_string()));
                }
                if entry.content.as_text() == Some(text) {
                    return Ok(TreeChange::default());
                }
                entry.content = FileContent::Text(text.to_string());
                Ok(TreeChange {
                    modified: vec![path.clone()],
                    ..TreeChange::default()
                })
            }
            Some(FileNode::Folder(_)) => Err(TreeError::KindConflict {
                path: path.to_string(),
                existing: "folder",
            }),
            None => Err(TreeError::PathNotFound(path.to_string())),
        }
    }

    /// Remove a node; folders take their descendants with them
    pub fn remove(&mut self, path: &ProjectPath) -> Result<TreeChange, TreeError> {
        if !self.nodes.contains_key(path) {
            return Err(TreeError::PathNotFound(path.to_string()));
        }
        let mut removed: Vec<ProjectPath> = self
            .nodes
            .keys()
            .filter(|p| p.is_descendant_of(path))
            .cloned()
            .collect();
        removed.push(path.clone());
        removed.sort();
        for p in &removed {
            self.nodes.remove(p);
        }
        Ok(TreeChange {
            removed,
            ..TreeChange::default()
        })
    }

    pub fn set_locked(&mut self, path: &ProjectPath, locked: bool) -> Result<(), TreeError> {
        match self.nodes.get_mut(path) {
            Some(FileNode::File(entry)) => {
                entry.locked = locked;
                Ok(())
            }
            Some(FileNode::Folder(_)) => Err(TreeError::KindConflict {
                path: path.to_string(),
                existing: "folder",
            }),
            None => Err(TreeError::PathNotFound(path.to_string())),
        }
    }

    pub fn is_locked(&self, path: &str) -> bool {
        self.nodes.get(path).is_some_and(is_locked_file)
    }

    pub fn get_file(&self, path: &str) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Number of file (not folder) nodes
    pub fn file_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_folder()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in path order
    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    fn upsert_file(
        &mut self,
        path: &ProjectPath,
        content: FileContent,
    ) -> Result<TreeChange, TreeError> {
        let locked = match self.nodes.get(path) {
            Some(FileNode::File(entry)) if entry.locked => {
                return Err(TreeError::FileLocked(path.to_string()));
            }
            Some(FileNode::File(entry)) if entry.content == content => {
                return Ok(TreeChange::default());
            }
            _ => false,
        };
        let mut staged = self.nodes.clone();
        stage_insert(
            &mut staged,
            FileNode::File(FileEntry {
                path: path.clone(),
                content,
                locked,
            }),
        )?;
        let change = TreeChange::diff(&self.nodes, &staged);
        self.nodes = staged;
        Ok(change)
    }
}

fn is_locked_file(node: &FileNode) -> bool {
    matches!(node, FileNode::File(FileEntry { locked: true, .. }))
}

/// Insert a node into a staging map, creating missing ancestor folders
fn stage_insert(
    staged: &mut BTreeMap<ProjectPath, FileNode>,
    node: FileNode,
) -> Result<(), TreeError> {
    let path = node.path().clone();
    let ancestors = path.ancestors();

    for ancestor in &ancestors {
        if let Some(FileNode::File(_)) = staged.get(ancestor) {
            return Err(TreeError::KindConflict {
                path: ancestor.to_string(),
                existing: "file",
            });
        }
    }

    if let Some(existing) = staged.get(&path) {
        if existing.is_folder() != node.is_folder() {
            return Err(TreeError::KindConflict {
                path: path.to_string(),
                existing: existing.kind_name(),
            });
        }
    }

    for ancestor in ancestors {
        staged
            .entry(ancestor.clone())
            .or_insert_with(|| FileNode::folder(ancestor));
    }
    staged.insert(path, node);
    Ok(())
}

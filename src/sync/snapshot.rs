//! Point-in-time copies of the tree used as export input.

use crate::document::DocumentStore;
use crate::tree::{FileChange, FileContent, FileNode, FileTreeStore, ProjectPath};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Whether unsaved document buffers are overlaid on the tree content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    SavedOnly,
    IncludeUnsaved,
}

/// Entry handed to archive builders and git transports.
///
/// Paths are relative to the project root and have no leading slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    Folder {
        path: String,
    },
    File {
        path: String,
        bytes: Vec<u8>,
        is_binary: bool,
    },
}

impl ArchiveEntry {
    pub fn path(&self) -> &str {
        match self {
            ArchiveEntry::Folder { path } | ArchiveEntry::File { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SnapshotNode {
    Folder(ProjectPath),
    File {
        path: ProjectPath,
        content: FileContent,
    },
}

/// Immutable copy of the project taken when an operation starts
#[derive(Debug, Clone)]
pub struct Snapshot {
    nodes: Vec<SnapshotNode>,
    taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Copy the tree, optionally overlaying dirty text buffers
    pub fn capture(tree: &FileTreeStore, documents: Option<&DocumentStore>) -> Self {
        let nodes = tree
            .iter()
            .map(|node| match node {
                FileNode::Folder(folder) => SnapshotNode::Folder(folder.path.clone()),
                FileNode::File(entry) => {
                    let buffer = documents
                        .and_then(|docs| docs.get(entry.path.as_str()))
                        .filter(|doc| doc.is_dirty() && !doc.is_binary());
                    let content = match buffer {
                        Some(doc) => FileContent::Text(doc.value().to_string()),
                        None => entry.content.clone(),
                    };
                    SnapshotNode::File {
                        path: entry.path.clone(),
                        content,
                    }
                }
            })
            .collect();
        Self {
            nodes,
            taken_at: Utc::now(),
        }
    }

    /// Build a snapshot directly from nodes
    pub fn from_nodes(nodes: impl IntoIterator<Item = FileNode>) -> Self {
        let mut tree = FileTreeStore::new();
        for node in nodes {
            let path = node.path().clone();
            let result = match node {
                FileNode::Folder(_) => tree.create_folder(&path),
                FileNode::File(entry) => {
                    tree.apply_change(&path, FileChange::Write(entry.content))
                }
            };
            if let Err(e) = result {
                tracing::warn!(path = %path, error = %e, "Skipping node in snapshot");
            }
        }
        Self::capture(&tree, None)
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, SnapshotNode::File { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entries relative to `project_root`, in path order
    pub fn entries(&self, project_root: &str) -> Vec<ArchiveEntry> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                SnapshotNode::Folder(path) => path
                    .relative_to(project_root)
                    .map(|path| ArchiveEntry::Folder { path }),
                SnapshotNode::File { path, content } => {
                    path.relative_to(project_root).map(|path| ArchiveEntry::File {
                        path,
                        bytes: content.as_bytes().to_vec(),
                        is_binary: content.is_binary(),
                    })
                }
            })
            .collect()
    }

    /// Every directory an export must create, parents before children
    pub fn directories(&self, project_root: &str) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        for entry in self.entries(project_root) {
            let path = entry.path().to_string();
            if let ArchiveEntry::Folder { .. } = entry {
                dirs.insert(path.clone());
            }
            let mut rest = path.as_str();
            while let Some(idx) = rest.rfind('/') {
                rest = &rest[..idx];
                dirs.insert(rest.to_string());
            }
        }
        let mut dirs: Vec<String> = dirs.into_iter().collect();
        dirs.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
        dirs
    }
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Anything that can produce a snapshot on demand
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self, policy: BufferPolicy) -> Snapshot;
}

impl SnapshotSource for Snapshot {
    fn snapshot(&self, _policy: BufferPolicy) -> Snapshot {
        self.clone()
    }
}

//! File tree node types

use super::path::ProjectPath;
use serde::{Deserialize, Serialize};

/// File payload: text or raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Classify raw bytes: valid UTF-8 without NUL bytes is text
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.contains(&0) {
            return FileContent::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text),
            Err(e) => FileContent::Binary(e.into_bytes()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Binary(bytes) => bytes,
        }
    }

    /// Text content, `None` for binary files
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

/// File entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: ProjectPath,
    pub content: FileContent,
    #[serde(default)]
    pub locked: bool,
}

impl FileEntry {
    pub fn is_binary(&self) -> bool {
        self.content.is_binary()
    }
}

/// Folder entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub path: ProjectPath,
}

/// Node in the project tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileNode {
    File(FileEntry),
    Folder(FolderEntry),
}

impl FileNode {
    /// Unlocked file node
    pub fn file(path: ProjectPath, content: impl Into<FileContent>) -> Self {
        FileNode::File(FileEntry {
            path,
            content: content.into(),
            locked: false,
        })
    }

    pub fn folder(path: ProjectPath) -> Self {
        FileNode::Folder(FolderEntry { path })
    }

    pub fn path(&self) -> &ProjectPath {
        match self {
            FileNode::File(f) => &f.path,
            FileNode::Folder(f) => &f.path,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            FileNode::File(f) => Some(f),
            FileNode::Folder(_) => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FileNode::Folder(_))
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            FileNode::File(_) => "file",
            FileNode::Folder(_) => "folder",
        }
    }
}

//! File Tree
//!
//! Canonical mapping from project path to file or folder node; the source of
//! truth for what exists in the project.

pub mod loader;
pub mod node;
pub mod path;
pub mod store;

pub use node::{FileContent, FileEntry, FileNode, FolderEntry};
pub use path::ProjectPath;
pub use store::{FileChange, FileTreeStore, SetMode, TreeChange};

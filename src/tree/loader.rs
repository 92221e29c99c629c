//! Load a directory on disk into tree nodes.

use super::node::{FileContent, FileNode};
use super::path::ProjectPath;
use crate::error::ApiError;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Walk `root` and map every entry below it to a node under `project_root`.
///
/// Entries whose file name appears in `ignore_names` are skipped together with
/// their subtree.
pub fn load_directory(
    root: &Path,
    project_root: &str,
    ignore_names: &[String],
) -> Result<Vec<FileNode>, ApiError> {
    let base = project_root.trim_end_matches('/');
    let mut nodes = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !ignore_names
                    .iter()
                    .any(|name| entry.file_name().to_string_lossy() == name.as_str())
        });

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.depth() == 0 {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ApiError::ConfigError(format!("Failed to relativize path: {}", e)))?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        let path = ProjectPath::parse(&format!("{}/{}", base, relative))?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            nodes.push(FileNode::folder(path));
        } else if file_type.is_file() {
            let bytes = std::fs::read(entry.path())?;
            nodes.push(FileNode::file(path, FileContent::from_bytes(bytes)));
        }
    }

    debug!(root = %root.display(), nodes = nodes.len(), "Loaded directory");
    Ok(nodes)
}

//! Project path normalization and validation.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Absolute, `/`-delimited path of a node in the project.
///
/// Always starts with `/`, never ends with one, and contains no empty, `.` or
/// `..` segments. Text is stored in Unicode NFC so that visually identical
/// names map to the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Parse and validate a path
    pub fn parse(raw: &str) -> Result<Self, TreeError> {
        let invalid = |reason: &str| TreeError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let normalized: String = raw.replace('\\', "/").nfc().collect();
        if !normalized.starts_with('/') {
            return Err(invalid("must be absolute"));
        }
        if normalized == "/" {
            return Err(invalid("the project root is not a node"));
        }
        if normalized.ends_with('/') {
            return Err(invalid("trailing slash"));
        }
        for segment in normalized[1..].split('/') {
            match segment {
                "" => return Err(invalid("empty segment")),
                "." | ".." => return Err(invalid("relative segment")),
                _ => {}
            }
        }
        Ok(ProjectPath(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Parent folder, `None` for top-level entries
    pub fn parent(&self) -> Option<ProjectPath> {
        let idx = self.0.rfind('/')?;
        if idx == 0 {
            None
        } else {
            Some(ProjectPath(self.0[..idx].to_string()))
        }
    }

    /// All ancestor folders, outermost first
    pub fn ancestors(&self) -> Vec<ProjectPath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(p) = current {
            current = p.parent();
            out.push(p);
        }
        out.reverse();
        out
    }

    /// Whether `self` lies strictly below `folder`
    pub fn is_descendant_of(&self, folder: &ProjectPath) -> bool {
        self.0.len() > folder.0.len()
            && self.0.starts_with(folder.as_str())
            && self.0.as_bytes()[folder.0.len()] == b'/'
    }

    /// Path relative to a project root, without a leading slash.
    ///
    /// `None` for the root itself and its ancestors. Paths outside the root
    /// fall back to the path minus its leading slash.
    pub fn relative_to(&self, project_root: &str) -> Option<String> {
        let root = project_root.trim_end_matches('/');
        if root.is_empty() {
            return Some(self.0[1..].to_string());
        }
        if self.0 == root || root.starts_with(&format!("{}/", self.0)) {
            return None;
        }
        match self.0.strip_prefix(root).and_then(|rest| rest.strip_prefix('/')) {
            Some(rel) => Some(rel.to_string()),
            None => Some(self.0[1..].to_string()),
        }
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProjectPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectPath {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProjectPath::parse(&value)
    }
}

impl TryFrom<&str> for ProjectPath {
    type Error = TreeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ProjectPath::parse(value)
    }
}

impl From<ProjectPath> for String {
    fn from(path: ProjectPath) -> Self {
        path.0
    }
}

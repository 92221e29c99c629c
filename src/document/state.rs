//! Per-path document state.

use crate::tree::ProjectPath;
use serde::{Deserialize, Serialize};

/// Cursor/scroll position in an editor; never affects dirtiness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub line: u32,
    pub column: u32,
}

impl ScrollPosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Editable buffer derived from one file
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub(crate) value: String,
    pub(crate) original_value: String,
    pub(crate) scroll: ScrollPosition,
    pub(crate) is_binary: bool,
    pub(crate) last_touched: u64,
}

impl DocumentState {
    pub(crate) fn new(content: String, is_binary: bool, touched: u64) -> Self {
        Self {
            original_value: content.clone(),
            value: content,
            scroll: ScrollPosition::default(),
            is_binary,
            last_touched: touched,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Last saved or loaded baseline
    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    pub fn is_dirty(&self) -> bool {
        self.value != self.original_value
    }
}

/// Read-model copy of a document handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub path: ProjectPath,
    pub value: String,
    pub scroll: ScrollPosition,
    pub is_dirty: bool,
    pub is_binary: bool,
}

impl DocumentView {
    pub(crate) fn from_state(path: &ProjectPath, state: &DocumentState) -> Self {
        Self {
            path: path.clone(),
            value: state.value.clone(),
            scroll: state.scroll,
            is_dirty: state.is_dirty(),
            is_binary: state.is_binary,
        }
    }
}

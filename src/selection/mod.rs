//! Selection & View State
//!
//! Which file is selected, which view is visible, and the auxiliary panel
//! flags. Independent of whether the selected file has an open document.

use crate::tree::{ProjectPath, TreeChange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Main workbench view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Code,
    Preview,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Code => f.write_str("code"),
            View::Preview => f.write_str("preview"),
        }
    }
}

/// Live preview served by the running project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewTarget {
    pub port: u16,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub selected_file: Option<ProjectPath>,
    pub current_view: View,
    pub terminal_visible: bool,
    pub workbench_visible: bool,
}

/// Selection state plus the live preview targets the view rule watches
#[derive(Debug, Default)]
pub struct SelectionStore {
    state: SelectionState,
    previews: BTreeMap<u16, PreviewTarget>,
    had_preview: bool,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&ProjectPath> {
        self.state.selected_file.as_ref()
    }

    /// Returns whether the selection changed
    pub fn select(&mut self, path: Option<ProjectPath>) -> bool {
        if self.state.selected_file == path {
            return false;
        }
        self.state.selected_file = path;
        true
    }

    /// Returns whether the view changed
    pub fn set_view(&mut self, view: View) -> bool {
        if self.state.current_view == view {
            return false;
        }
        self.state.current_view = view;
        true
    }

    /// Returns whether the flag changed
    pub fn toggle_terminal(&mut self, visible: bool) -> bool {
        let changed = self.state.terminal_visible != visible;
        self.state.terminal_visible = visible;
        changed
    }

    /// Returns whether the flag changed
    pub fn set_workbench_visible(&mut self, visible: bool) -> bool {
        let changed = self.state.workbench_visible != visible;
        self.state.workbench_visible = visible;
        changed
    }

    /// Clear the selection if the selected path was removed.
    ///
    /// Returns the cleared path.
    pub fn follow_tree(&mut self, change: &TreeChange) -> Option<ProjectPath> {
        let selected = self.state.selected_file.as_ref()?;
        if change.removed.contains(selected) {
            return self.state.selected_file.take();
        }
        None
    }

    /// Register a preview target, replacing any target on the same port
    pub fn add_preview(&mut self, target: PreviewTarget) -> bool {
        self.previews.insert(target.port, target.clone()) != Some(target)
    }

    pub fn remove_preview(&mut self, port: u16) -> bool {
        self.previews.remove(&port).is_some()
    }

    pub fn previews(&self) -> Vec<PreviewTarget> {
        self.previews.values().cloned().collect()
    }

    /// Standing auto-preview rule.
    ///
    /// Switches to the preview view when live previews go from none to at
    /// least one. Re-evaluated after every tree and preview change; returns
    /// whether the view changed.
    pub fn apply_preview_rule(&mut self) -> bool {
        let has_preview = !self.previews.is_empty();
        let became_available = has_preview && !self.had_preview;
        self.had_preview = has_preview;
        became_available && self.set_view(View::Preview)
    }
}

//! Change notifications
//!
//! Observer bus the presentation layer subscribes to. Events of one mutation
//! are delivered in a fixed order: tree, then documents, then selection, then
//! sync.

use crate::selection::View;
use crate::sync::SyncKind;
use crate::tree::{ProjectPath, TreeChange};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Workbench change event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkbenchEvent {
    FilesChanged {
        added: Vec<ProjectPath>,
        modified: Vec<ProjectPath>,
        removed: Vec<ProjectPath>,
    },
    DocumentOpened { path: ProjectPath },
    DocumentRefreshed { path: ProjectPath },
    DocumentRetired { path: ProjectPath },
    DocumentEvicted { path: ProjectPath },
    DirtyChanged { path: ProjectPath, dirty: bool },
    DocumentSaved { path: ProjectPath },
    SelectionChanged { selected: Option<ProjectPath> },
    ViewChanged { view: View },
    TerminalToggled { visible: bool },
    WorkbenchVisibilityChanged { visible: bool },
    PreviewsChanged { count: usize },
    SyncStarted { kind: SyncKind },
    SyncFinished {
        kind: SyncKind,
        success: bool,
        message: String,
    },
    RemoteLinked { url: String },
}

impl WorkbenchEvent {
    pub(crate) fn files_changed(change: &TreeChange) -> Self {
        WorkbenchEvent::FilesChanged {
            added: change.added.clone(),
            modified: change.modified.clone(),
            removed: change.removed.clone(),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&WorkbenchEvent) + Send + Sync>;

/// Listener registry shared by every component of one workbench
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Vec<(SubscriptionId, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&WorkbenchEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Deliver one event to every listener in subscription order.
    ///
    /// Listeners run without the registry lock held, so they may subscribe or
    /// call back into the workbench.
    pub fn emit(&self, event: &WorkbenchEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn emit_all(&self, events: &[WorkbenchEvent]) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

//! Single-slot lock for export operations.

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The three operations that share the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    DirectorySync,
    ArchiveExport,
    GitPush,
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncKind::DirectorySync => f.write_str("directory sync"),
            SyncKind::ArchiveExport => f.write_str("archive export"),
            SyncKind::GitPush => f.write_str("git push"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub started_at: DateTime<Utc>,
}

/// Current state of the slot; at most one operation is ever in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncOperation {
    #[default]
    Idle,
    DirectorySync(InFlight),
    ArchiveExport(InFlight),
    GitPush(InFlight),
}

impl SyncOperation {
    fn start(kind: SyncKind) -> Self {
        let in_flight = InFlight {
            started_at: Utc::now(),
        };
        match kind {
            SyncKind::DirectorySync => SyncOperation::DirectorySync(in_flight),
            SyncKind::ArchiveExport => SyncOperation::ArchiveExport(in_flight),
            SyncKind::GitPush => SyncOperation::GitPush(in_flight),
        }
    }

    pub fn kind(&self) -> Option<SyncKind> {
        match self {
            SyncOperation::Idle => None,
            SyncOperation::DirectorySync(_) => Some(SyncKind::DirectorySync),
            SyncOperation::ArchiveExport(_) => Some(SyncKind::ArchiveExport),
            SyncOperation::GitPush(_) => Some(SyncKind::GitPush),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SyncOperation::Idle)
    }
}

/// Shared slot holding the in-flight operation
#[derive(Debug, Clone, Default)]
pub struct OperationSlot {
    current: Arc<Mutex<SyncOperation>>,
}

impl OperationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot or fail with `Busy` naming the running operation
    pub fn try_begin(&self, kind: SyncKind) -> Result<OperationGuard, SyncError> {
        let mut current = self.current.lock();
        if let Some(in_flight) = current.kind() {
            return Err(SyncError::Busy { in_flight });
        }
        *current = SyncOperation::start(kind);
        Ok(OperationGuard {
            slot: Arc::clone(&self.current),
            kind,
        })
    }

    pub fn current(&self) -> SyncOperation {
        *self.current.lock()
    }

    pub fn is_busy(&self) -> bool {
        !self.current.lock().is_idle()
    }
}

/// Returns the slot to `Idle` when dropped, on every exit path
#[derive(Debug)]
pub struct OperationGuard {
    slot: Arc<Mutex<SyncOperation>>,
    kind: SyncKind,
}

impl OperationGuard {
    pub fn kind(&self) -> SyncKind {
        self.kind
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        *self.slot.lock() = SyncOperation::Idle;
    }
}

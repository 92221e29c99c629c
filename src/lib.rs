//! Workbench: project state and export core
//!
//! Holds a project's file tree, the editable documents opened over it and the
//! selection/view state, and exports the project to a directory, a ZIP
//! archive or a git remote with at most one export in flight.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod logging;
pub mod selection;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod workbench;

pub use error::{ApiError, DocumentError, SyncError, TreeError};
pub use events::{EventBus, SubscriptionId, WorkbenchEvent};
pub use workbench::Workbench;

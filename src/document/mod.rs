//! Documents
//!
//! Per-path editable buffers with dirty tracking, scroll position and a
//! bounded history of saved versions.

pub mod history;
pub mod state;
pub mod store;

pub use history::{DocumentHistory, HistoryVersion};
pub use state::{DocumentState, DocumentView, ScrollPosition};
pub use store::{DocumentStore, DocumentSync, SaveOutcome};

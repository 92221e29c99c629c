//! Integration tests for the workbench core

mod config_loading;
mod document_scenarios;
mod selection_scenarios;
mod support;
mod sync_scenarios;

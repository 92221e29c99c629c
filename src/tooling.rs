//! Tooling & Integration Layer
//!
//! Command-line front end over a [`crate::Workbench`] loaded from a directory
//! on disk.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};

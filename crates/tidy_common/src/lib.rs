//! Tidy Common - shared types for the maintenance tool runner.
//!
//! Tool identifiers, the descriptor table, run outcomes, configuration and
//! plan-tier policy. Nothing in here touches processes or the filesystem
//! beyond reading config files.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod outcome;
pub mod subscription;
pub mod tool;
pub mod ui;

pub use config::Config;
pub use descriptor::{
    CommandDescriptor, ProcessSpec, ResultPolicy, SweepSpec, ToolAction, ToolKind, ToolTable,
};
pub use error::{Result, TidyError};
pub use outcome::{OutcomeStatus, OutputChunk, RunOutcome};
pub use tool::ToolId;

/// Workspace version, shared by every binary
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

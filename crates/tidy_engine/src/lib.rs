//! Tidy Engine - runs maintenance tools and reports their outcome.
//!
//! The dispatcher resolves a tool identifier against the descriptor table
//! and hands it to one of the executors: the process runner (with live
//! stdout relayed to a subscriber), the temp-file sweeper, the settings
//! opener, or the in-process system report.

pub mod dispatcher;
pub mod relay;
pub mod report;
pub mod runner;
pub mod settings;
pub mod sweeper;

pub use dispatcher::Dispatcher;
pub use relay::{OutputRelay, OutputStream};
pub use runner::{LaunchedProcess, ProcessLauncher, ProcessRunner, SystemLauncher};
pub use settings::{SettingsOpener, SystemOpener};
pub use sweeper::SweepReport;

//! Tidy Control - command handlers behind the `tidyctl` binary.

pub mod commands;
pub mod errors;

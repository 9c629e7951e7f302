//! Error types for tidy.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("elevated privilege required")]
    ElevationRequired,

    #[error("{program} failed with code {code}")]
    ExternalProcessFailure {
        program: String,
        code: String,
        stderr: String,
    },

    /// The OS refused to start the program at all.
    #[error("{source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot remove {}: {source}", path.display())]
    FilesystemEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Billing error: {0}")]
    Billing(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TidyError {
    /// Launch failures are folded into the elevation case: the usual reason a
    /// system repair binary cannot be started is missing rights.
    pub fn requires_elevation(&self) -> bool {
        matches!(self, TidyError::ElevationRequired | TidyError::Launch { .. })
    }

    /// Diagnostic output captured alongside the error, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            TidyError::ExternalProcessFailure { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;

//! Run outcomes and streamed output chunks.
//!
//! A `RunOutcome` is built once per dispatch and handed to the caller. Its
//! fields are private so the three states stay mutually exclusive: an
//! outcome that needs elevation can never also report success.

use crate::error::TidyError;
use serde::{Deserialize, Serialize};

/// Which of the three terminal states an outcome is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    ElevationRequired,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    requires_elevated_privilege: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    freed_bytes: Option<u64>,
}

impl RunOutcome {
    pub fn succeeded(message: impl Into<String>, output: Option<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            output,
            requires_elevated_privilege: false,
            deleted_count: None,
            freed_bytes: None,
        }
    }

    pub fn failed(error: impl Into<String>, output: Option<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            output,
            requires_elevated_privilege: false,
            deleted_count: None,
            freed_bytes: None,
        }
    }

    pub fn elevation_required(error: impl Into<String>) -> Self {
        Self {
            requires_elevated_privilege: true,
            ..Self::failed(error, None)
        }
    }

    /// Sweep result; a sweep that deleted nothing is still a success
    pub fn swept(deleted_count: u64, freed_bytes: u64) -> Self {
        let mb = format_megabytes(freed_bytes);
        Self {
            deleted_count: Some(deleted_count),
            freed_bytes: Some(freed_bytes),
            ..Self::succeeded(
                format!(
                    "Cleanup finished: {} files deleted ({} MB freed)",
                    deleted_count, mb
                ),
                Some(format!(
                    "Files deleted: {}\nSpace freed: {} MB",
                    deleted_count, mb
                )),
            )
        }
    }

    /// Map an executor error onto the outcome contract
    pub fn from_error(err: &TidyError) -> Self {
        if err.requires_elevation() {
            return Self::elevation_required(err.to_string());
        }
        Self::failed(err.to_string(), err.diagnostics().map(str::to_string))
    }

    pub fn status(&self) -> OutcomeStatus {
        match (self.success, self.requires_elevated_privilege) {
            (true, _) => OutcomeStatus::Success,
            (false, true) => OutcomeStatus::ElevationRequired,
            (false, false) => OutcomeStatus::Failed,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn requires_elevated_privilege(&self) -> bool {
        self.requires_elevated_privilege
    }

    pub fn deleted_count(&self) -> Option<u64> {
        self.deleted_count
    }

    pub fn freed_bytes(&self) -> Option<u64> {
        self.freed_bytes
    }
}

/// One fragment of a running process's stdout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChunk {
    pub text: String,
}

impl OutputChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}

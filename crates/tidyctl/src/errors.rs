//! Exit codes for tidyctl

use tidy_common::{OutcomeStatus, RunOutcome};

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for a tool that ran and failed, or any other error
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when the tool identifier matches no alias
pub const EXIT_UNKNOWN_TOOL: i32 = 2;

/// Exit code when the tool needs an elevated prompt
pub const EXIT_ELEVATION: i32 = 3;

/// Map a finished run onto the process exit code
pub fn exit_code_for(outcome: &RunOutcome, known_tool: bool) -> i32 {
    match outcome.status() {
        OutcomeStatus::Success => EXIT_SUCCESS,
        OutcomeStatus::ElevationRequired => EXIT_ELEVATION,
        OutcomeStatus::Failed if !known_tool => EXIT_UNKNOWN_TOOL,
        OutcomeStatus::Failed => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&RunOutcome::succeeded("ok", None), true), EXIT_SUCCESS);
        assert_eq!(exit_code_for(&RunOutcome::failed("bad", None), true), EXIT_FAILURE);
        assert_eq!(exit_code_for(&RunOutcome::failed("Unknown tool: x", None), false), EXIT_UNKNOWN_TOOL);
        assert_eq!(
            exit_code_for(&RunOutcome::elevation_required("admin"), true),
            EXIT_ELEVATION
        );
    }
}

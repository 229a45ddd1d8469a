//! How a run ended, and the process exit code it maps to.

use std::process::ExitCode;

use crate::task::types::TaskErrorKind;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_INTERNAL: u8 = 1;
pub const EXIT_VALIDATION: u8 = 2;
pub const EXIT_UPSTREAM: u8 = 3;
pub const EXIT_TIMEOUT: u8 = 4;
pub const EXIT_ABORTED: u8 = 130;

/// Final state of a batch run or a standby server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Batch task succeeded and its result was stored, or standby drained cleanly.
    Succeeded,
    /// The task failed with this kind of error.
    Failed(TaskErrorKind),
    /// The task succeeded but its result could not be stored.
    SinkFailed,
    /// An abort arrived before the batch task finished.
    Aborted,
    /// Standby handlers were still running at the grace deadline.
    ForcedStop,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Succeeded => EXIT_SUCCESS,
            RunOutcome::Failed(kind) => match kind {
                TaskErrorKind::Validation => EXIT_VALIDATION,
                TaskErrorKind::Upstream => EXIT_UPSTREAM,
                TaskErrorKind::Timeout => EXIT_TIMEOUT,
                TaskErrorKind::Internal
                | TaskErrorKind::Unauthorized
                | TaskErrorKind::MethodNotAllowed => EXIT_INTERNAL,
            },
            RunOutcome::SinkFailed | RunOutcome::ForcedStop => EXIT_INTERNAL,
            RunOutcome::Aborted => EXIT_ABORTED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

impl From<RunOutcome> for ExitCode {
    fn from(outcome: RunOutcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

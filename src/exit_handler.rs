//! Exit code logic for the exporter process.
//!
//! Single responsibility: map export counts to the process exit outcome.

use std::process::ExitCode;

/// Process outcome, mapped to a stable exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Every document was exported or already present (exit 0).
    Success,
    /// Some documents failed, at least one was exported or present (exit 1).
    Partial,
    /// Nothing usable was produced, or the export could not start (exit 2).
    Failure,
}

impl ProcessExit {
    /// Returns the numeric exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(outcome: ProcessExit) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Determines the process exit outcome from exported and failed document counts.
pub(crate) fn determine_exit_outcome(exported: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if exported > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

//! Process exit codes and machine-readable error reports.

use serde::Serialize;

use crate::duplicates::ScanResult;

/// Exit status of a `bytedupe` run.
///
/// | code | meaning |
/// |------|---------|
/// | 0    | duplicates were found |
/// | 1    | the run failed |
/// | 2    | the run completed, nothing was duplicated |
/// | 3    | the run completed but some files could not be compared |
/// | 130  | interrupted with Ctrl+C |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    DuplicatesFound = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates were found.
    NoDuplicates = 2,
    /// Completed, but one or more files failed to open or read.
    FilesFailed = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Pick the exit code describing a finished scan.
    ///
    /// Interruption wins over failed files, which win over the duplicate
    /// outcome.
    #[must_use]
    pub fn for_result(result: &ScanResult) -> Self {
        if result.summary.interrupted {
            Self::Interrupted
        } else if !result.failed.is_empty() {
            Self::FilesFailed
        } else if result.has_duplicates() {
            Self::DuplicatesFound
        } else {
            Self::NoDuplicates
        }
    }

    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable machine-readable code, e.g. `BD001`.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::DuplicatesFound => "BD000",
            Self::GeneralError => "BD001",
            Self::NoDuplicates => "BD002",
            Self::FilesFailed => "BD003",
            Self::Interrupted => "BD130",
        }
    }
}

/// Error report printed to stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code (e.g. "BD001")
    pub code: String,
    /// Process exit code
    pub exit_code: i32,
    /// Error message including its context chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report for `err`, which ends the process with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

//! JSON report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     { "size": 1024, "files": ["/data/a.bin", "/backup/a.bin"] }
//!   ],
//!   "failed": [
//!     { "path": "/data/locked.bin", "size": 1024, "stage": "read", "offset": 512, "reason": "..." }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "length_buckets": 60,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "duplicate_bytes": 51200,
//!     "failed_files": 1,
//!     "scan_errors": 0,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     "exit_code": 3,
//!     "exit_code_name": "BD003"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, FailedFile, FailureKind, ScanResult, ScanSummary};
use crate::error::ExitCode;

/// A duplicate group in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Shared length in bytes
    pub size: u64,
    /// Member paths, in discovery order
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            size: group.representative_length(),
            files: group
                .files()
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// A failed file in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailedFile {
    /// Path of the file
    pub path: String,
    /// Declared length in bytes
    pub size: u64,
    /// Whether opening or reading failed, with the read offset
    #[serde(flatten)]
    pub kind: FailureKind,
    /// Error message
    pub reason: String,
}

impl From<&FailedFile> for JsonFailedFile {
    fn from(failed: &FailedFile) -> Self {
        Self {
            path: failed.entry.path.to_string_lossy().into_owned(),
            size: failed.entry.size,
            kind: failed.kind,
            reason: failed.reason.clone(),
        }
    }
}

/// Summary statistics in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files handed to the comparison
    pub total_files: usize,
    /// Their total size in bytes
    pub total_size: u64,
    /// Distinct lengths
    pub length_buckets: usize,
    /// Duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, one copy per group excluded
    pub duplicate_files: usize,
    /// Bytes held by those duplicates
    pub duplicate_bytes: u64,
    /// Files that failed to open or read
    pub failed_files: usize,
    /// Directory entries that could not be read
    pub scan_errors: usize,
    /// Wall time in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the run was cut short
    pub interrupted: bool,
    /// Process exit code
    pub exit_code: i32,
    /// Machine-readable exit code (e.g. "BD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Build from a summary and the exit code of the run.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            length_buckets: summary.length_buckets,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            duplicate_bytes: summary.duplicate_bytes,
            failed_files: summary.failed_files,
            scan_errors: summary.scan_errors,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups, largest length first
    pub groups: Vec<JsonDuplicateGroup>,
    /// Failed files, sorted by path
    pub failed: Vec<JsonFailedFile>,
    /// Statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a finished scan.
    #[must_use]
    pub fn new(result: &ScanResult) -> Self {
        Self {
            groups: result.groups.iter().map(JsonDuplicateGroup::from).collect(),
            failed: result.failed.iter().map(JsonFailedFile::from).collect(),
            summary: JsonSummary::from_scan_summary(&result.summary, ExitCode::for_result(result)),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

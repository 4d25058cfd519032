//! Final ordering and summary statistics.
//!
//! [`ResultAggregator`] takes the unordered output of the coordinator and
//! produces a [`ScanResult`]: duplicate groups sorted by length, largest
//! first, the failed files, and a [`ScanSummary`].

use std::time::Duration;

use bytesize::ByteSize;

use super::coordinator::CoordinatorOutcome;
use super::groups::{DuplicateGroup, FailedFile};

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Total number of files handed to the engine
    pub total_files: usize,
    /// Total declared size of those files in bytes
    pub total_size: u64,
    /// Number of distinct lengths seen
    pub length_buckets: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one copy per group)
    pub duplicate_files: usize,
    /// Bytes held by those duplicate files
    pub duplicate_bytes: u64,
    /// Files that could not be opened or read
    pub failed_files: usize,
    /// Directory entries the walker could not read
    pub scan_errors: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.duplicate_bytes as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format duplicate bytes as human-readable string.
    #[must_use]
    pub fn duplicate_bytes_display(&self) -> String {
        format_size(self.duplicate_bytes)
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        format_size(self.total_size)
    }

    /// One-line summary, e.g. `3 duplicate files in 1.2 MiB.`
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{} duplicate files in {}.",
            self.duplicate_files,
            self.duplicate_bytes_display()
        )
    }
}

/// Format a byte size as a human-readable string (IEC units).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Duplicate groups, largest length first
    pub groups: Vec<DuplicateGroup>,
    /// Failed files, sorted by path
    pub failed: Vec<FailedFile>,
    /// Aggregate statistics
    pub summary: ScanSummary,
}

impl ScanResult {
    /// Whether any duplicate was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

/// Collects groups and failures and orders them.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    groups: Vec<DuplicateGroup>,
    failed: Vec<FailedFile>,
    interrupted: bool,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one duplicate group.
    pub fn add_group(&mut self, group: DuplicateGroup) {
        self.groups.push(group);
    }

    /// Add one failed file.
    pub fn add_failed(&mut self, failed: FailedFile) {
        self.failed.push(failed);
    }

    /// Absorb everything a coordinator run produced.
    pub fn absorb(&mut self, outcome: CoordinatorOutcome) {
        self.groups.extend(outcome.groups);
        self.failed.extend(outcome.failed);
        self.interrupted |= outcome.interrupted;
    }

    /// Sort and summarize.
    ///
    /// Groups are ordered by length descending; equal lengths are ordered by
    /// the path of their first member so output is stable across runs and
    /// thread counts. `base` supplies the counters only the caller knows
    /// (totals, duration); the duplicate and failure counters are filled in
    /// here.
    #[must_use]
    pub fn finish(mut self, base: ScanSummary) -> ScanResult {
        self.groups.sort_by(|a, b| {
            b.representative_length()
                .cmp(&a.representative_length())
                .then_with(|| a.files()[0].path.cmp(&b.files()[0].path))
        });
        self.failed.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));

        let summary = ScanSummary {
            duplicate_groups: self.groups.len(),
            duplicate_files: self.groups.iter().map(DuplicateGroup::duplicate_count).sum(),
            duplicate_bytes: self.groups.iter().map(DuplicateGroup::wasted_space).sum(),
            failed_files: self.failed.len(),
            interrupted: base.interrupted || self.interrupted,
            ..base
        };

        ScanResult {
            groups: self.groups,
            failed: self.failed,
            summary,
        }
    }
}

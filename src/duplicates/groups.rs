//! Length buckets and result groups.
//!
//! # Overview
//!
//! Files with different lengths cannot be identical, so discovery feeds every
//! file into a [`BucketMap`] keyed by declared length. Each bucket is a
//! [`CandidateGroup`]; the partitioner later turns it into zero or more
//! [`DuplicateGroup`]s and reports unreadable members as [`FailedFile`]s.
//!
//! # Example
//!
//! ```
//! use bytedupe::duplicates::BucketMap;
//! use bytedupe::scanner::MemorySource;
//!
//! let mut buckets = BucketMap::new();
//! buckets.add_file(MemorySource::new("/a", b"1234".to_vec()));
//! buckets.add_file(MemorySource::new("/b", b"abcd".to_vec()));
//! buckets.add_file(MemorySource::new("/c", b"xy".to_vec()));
//!
//! let stats = buckets.stats();
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.buckets, 2);
//! assert_eq!(stats.potential_duplicates, 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scanner::{ByteSource, FileEntry};

/// Files sharing one declared length.
#[derive(Debug)]
pub struct CandidateGroup<S> {
    length: u64,
    members: Vec<S>,
}

impl<S: ByteSource> CandidateGroup<S> {
    /// Create an empty group for the given length.
    #[must_use]
    pub fn new(length: u64) -> Self {
        Self {
            length,
            members: Vec::new(),
        }
    }

    /// Append a member.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if the source length doesn't match the group.
    pub fn add(&mut self, source: S) {
        debug_assert_eq!(
            source.length(),
            self.length,
            "source length {} doesn't match group length {}",
            source.length(),
            self.length
        );
        self.members.push(source);
    }

    /// Shared declared length.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[S] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether this bucket can produce a duplicate group at all.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }

    /// Consume the group, yielding its members in insertion order.
    #[must_use]
    pub fn into_members(self) -> Vec<S> {
        self.members
    }
}

/// Statistics over the length buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files added
    pub total_files: usize,
    /// Total declared bytes across all files
    pub total_size: u64,
    /// Number of distinct lengths
    pub buckets: usize,
    /// Buckets holding a single file
    pub singleton_buckets: usize,
    /// Files in buckets with two or more members
    pub potential_duplicates: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated because their length is unique.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.singleton_buckets as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Length-keyed map of candidate groups.
///
/// Singleton buckets are legal; no length filtering happens here.
#[derive(Debug)]
pub struct BucketMap<S> {
    buckets: BTreeMap<u64, CandidateGroup<S>>,
    total_files: usize,
}

impl<S: ByteSource> Default for BucketMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ByteSource> BucketMap<S> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            total_files: 0,
        }
    }

    /// Insert a file into the bucket for its declared length.
    pub fn add_file(&mut self, source: S) {
        let length = source.length();
        self.buckets
            .entry(length)
            .or_insert_with(|| CandidateGroup::new(length))
            .add(source);
        self.total_files += 1;
    }

    /// Number of distinct lengths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no file has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of files added.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Bucket for a given length.
    #[must_use]
    pub fn get(&self, length: u64) -> Option<&CandidateGroup<S>> {
        self.buckets.get(&length)
    }

    /// Lengths in ascending order.
    pub fn lengths(&self) -> impl Iterator<Item = u64> + '_ {
        self.buckets.keys().copied()
    }

    /// Summary of the current buckets.
    #[must_use]
    pub fn stats(&self) -> GroupingStats {
        let mut stats = GroupingStats {
            total_files: self.total_files,
            buckets: self.buckets.len(),
            ..Default::default()
        };
        for (length, group) in &self.buckets {
            stats.total_size += length * group.len() as u64;
            if group.has_duplicates() {
                stats.potential_duplicates += group.len();
            } else {
                stats.singleton_buckets += 1;
            }
        }
        stats
    }

    /// Consume the map, largest length first.
    #[must_use]
    pub fn into_buckets_largest_first(self) -> Vec<CandidateGroup<S>> {
        self.buckets.into_values().rev().collect()
    }
}

impl<S: ByteSource> Extend<S> for BucketMap<S> {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for source in iter {
            self.add_file(source);
        }
    }
}

impl<S: ByteSource> FromIterator<S> for BucketMap<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Files proven byte-identical over their full shared length.
///
/// Always holds at least two files; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    size: u64,
    files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Build a group, refusing fewer than two members.
    #[must_use]
    pub fn try_new(size: u64, files: Vec<FileEntry>) -> Option<Self> {
        if files.len() < 2 {
            return None;
        }
        debug_assert!(files.iter().all(|f| f.size == size));
        Some(Self { size, files })
    }

    /// Shared length of every member.
    #[must_use]
    pub fn representative_length(&self) -> u64 {
        self.size
    }

    /// Members in the order they were discovered.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Number of files in this group.
    #[must_use]
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len() - 1
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<std::path::PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Where a file dropped out of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FailureKind {
    /// The file could not be opened.
    Open,
    /// Reading failed after `offset` bytes had been compared.
    Read {
        /// Bytes successfully read before the failure
        offset: u64,
    },
}

/// A file removed from consideration because of an I/O error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    /// Discovery metadata
    pub entry: FileEntry,
    /// Stage of the failure
    pub kind: FailureKind,
    /// Error message
    pub reason: String,
}

impl FailedFile {
    /// Record an open failure.
    #[must_use]
    pub fn open(entry: FileEntry, error: &std::io::Error) -> Self {
        Self {
            entry,
            kind: FailureKind::Open,
            reason: error.to_string(),
        }
    }

    /// Record a failure partway through the comparison.
    #[must_use]
    pub fn read(entry: FileEntry, offset: u64, error: &crate::scanner::ReadError) -> Self {
        Self {
            entry,
            kind: FailureKind::Read { offset },
            reason: error.to_string(),
        }
    }
}

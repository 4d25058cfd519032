//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Length-based bucketing of discovered files
//! - Byte-synchronized partitioning of each bucket
//! - Parallel fan-out across buckets
//! - Result ordering and summary statistics

pub mod aggregator;
pub mod coordinator;
pub mod finder;
pub mod groups;
pub mod partition;

pub use aggregator::{format_size, ResultAggregator, ScanResult, ScanSummary};
pub use coordinator::{Concurrency, CoordinatorOutcome, ParallelCoordinator};
pub use finder::{DuplicateFinder, FinderConfig, FinderError};
pub use groups::{
    BucketMap, CandidateGroup, DuplicateGroup, FailedFile, FailureKind, GroupingStats,
};
pub use partition::Partition;

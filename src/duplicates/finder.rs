//! Duplicate finder: the engine façade.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Discovery**: walk the roots (see [`crate::scanner::Walker`])
//! 2. **Length grouping**: bucket files by declared length ([`BucketMap`])
//! 3. **Partitioning**: compare each bucket byte by byte
//!    ([`ParallelCoordinator`], [`Partition`](super::Partition))
//! 4. **Aggregation**: sort groups and compute the summary ([`ResultAggregator`])
//!
//! No content is hashed; a file is read only as far as needed to tell it
//! apart from every other file of its length.
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::duplicates::{Concurrency, DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_concurrency(Concurrency::Available));
//! let result = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//! println!("{}", result.summary.headline());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::aggregator::{format_size, ResultAggregator, ScanResult, ScanSummary};
use super::coordinator::{Concurrency, ParallelCoordinator};
use super::groups::BucketMap;
use crate::progress::{ProgressCallback, PHASE_WALKING};
use crate::scanner::{ByteSource, FileEntry, FileSource, Walker, WalkerConfig};

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// How many length buckets may be compared at once.
    pub concurrency: Concurrency,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("concurrency", &self.concurrency)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the comparison concurrency.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that can occur during duplicate finding.
///
/// Per-file open and read failures are not errors; they end up in
/// [`ScanResult::failed`].
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted before comparison started.
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No root directory was given.
    #[error("No directories to scan")]
    NoRoots,

    /// The worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder orchestrating discovery, partitioning and aggregation.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files below the given roots.
    ///
    /// Directories that cannot be read are skipped and counted in
    /// [`ScanSummary::scan_errors`].
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - no root is given, or a root does not exist or is not a directory
    /// - the scan is interrupted during discovery
    /// - the worker pool cannot be created
    pub fn find_duplicates(&self, roots: &[PathBuf]) -> Result<ScanResult, FinderError> {
        let start_time = Instant::now();

        if roots.is_empty() {
            return Err(FinderError::NoRoots);
        }
        for root in roots {
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.clone()));
            }
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Adding files from {} root(s)", roots.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut walker = Walker::new(distinct_roots(roots), self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }

        let mut buckets = BucketMap::new();
        let mut scan_errors = 0usize;
        for result in walker.walk() {
            match result {
                Ok(file) => buckets.add_file(FileSource::new(file)),
                Err(e) => {
                    log::debug!("Skipped during discovery: {}", e);
                    scan_errors += 1;
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut result = self.partition_buckets(buckets, start_time)?;
        result.summary.scan_errors = scan_errors;
        Ok(result)
    }

    /// Find duplicates among already-discovered files.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be created.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<ScanResult, FinderError> {
        self.find_duplicates_from_sources(files.into_iter().map(FileSource::new))
    }

    /// Find duplicates among arbitrary byte sources.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be created.
    pub fn find_duplicates_from_sources<S, I>(&self, sources: I) -> Result<ScanResult, FinderError>
    where
        S: ByteSource,
        I: IntoIterator<Item = S>,
    {
        let start_time = Instant::now();
        let buckets: BucketMap<S> = sources.into_iter().collect();
        self.partition_buckets(buckets, start_time)
    }

    fn partition_buckets<S: ByteSource>(
        &self,
        buckets: BucketMap<S>,
        start_time: Instant,
    ) -> Result<ScanResult, FinderError> {
        let stats = buckets.stats();
        log::info!(
            "Added {} files ({}) in {} length groups, {:.1}% unique by length",
            stats.total_files,
            format_size(stats.total_size),
            stats.buckets,
            stats.elimination_rate()
        );

        let outcome = ParallelCoordinator::new(self.config.concurrency)
            .with_shutdown_flag(self.config.shutdown_flag.clone())
            .with_progress_callback(self.config.progress_callback.clone())
            .run(buckets)?;

        if outcome.interrupted {
            log::info!(
                "Interrupted after {} of {} length groups",
                outcome.buckets_processed,
                stats.buckets
            );
        }

        let mut aggregator = ResultAggregator::new();
        aggregator.absorb(outcome);
        let result = aggregator.finish(ScanSummary {
            total_files: stats.total_files,
            total_size: stats.total_size,
            length_buckets: stats.buckets,
            scan_duration: start_time.elapsed(),
            ..Default::default()
        });

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, {} failed",
            result.summary.duplicate_groups,
            result.summary.duplicate_files,
            result.summary.duplicate_bytes_display(),
            result.summary.failed_files
        );

        Ok(result)
    }
}

/// Drop roots that repeat or lie inside another root, so no file is
/// discovered twice and reported as a duplicate of itself.
fn distinct_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let canonical: Vec<PathBuf> = roots
        .iter()
        .map(|r| r.canonicalize().unwrap_or_else(|_| r.clone()))
        .collect();

    roots
        .iter()
        .enumerate()
        .filter(|&(i, root)| {
            let covered = canonical.iter().enumerate().any(|(j, other)| {
                j != i
                    && canonical[i].starts_with(other)
                    && (canonical[i] != *other || j < i)
            });
            if covered {
                log::warn!("Skipping {}: already covered by another root", root.display());
            }
            !covered
        })
        .map(|(_, root)| root.clone())
        .collect()
}

//! Fan-out of bucket partitioning across worker threads.
//!
//! # Overview
//!
//! Every length bucket is independent: the coordinator opens its members,
//! runs a [`Partition`] over them and appends the resulting duplicate groups
//! and failed files to one shared, mutex-guarded collection. Buckets are
//! visited largest length first.
//!
//! Parallelism is a caller choice ([`Concurrency`]); one bucket is always
//! handled by a single thread.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use super::finder::FinderError;
use super::groups::{BucketMap, CandidateGroup, DuplicateGroup, FailedFile};
use super::partition::Partition;
use crate::progress::{ProgressCallback, PHASE_COMPARE};
use crate::scanner::ByteSource;

/// How many buckets may be compared at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// One bucket at a time on the calling thread.
    #[default]
    Sequential,
    /// A pool of exactly this many workers.
    Bounded(NonZeroUsize),
    /// One worker per available hardware thread.
    Available,
}

impl Concurrency {
    /// Map a thread count setting: `0` = available parallelism, `1` =
    /// sequential, anything else a bounded pool.
    #[must_use]
    pub fn from_threads(threads: usize) -> Self {
        match threads {
            0 => Self::Available,
            1 => Self::Sequential,
            n => NonZeroUsize::new(n).map_or(Self::Sequential, Self::Bounded),
        }
    }

    /// Number of workers this setting resolves to on this machine.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Bounded(n) => n.get(),
            Self::Available => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

impl std::fmt::Display for Concurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "1"),
            Self::Bounded(n) => write!(f, "{}", n),
            Self::Available => write!(f, "{} (all cores)", self.worker_count()),
        }
    }
}

/// Everything the workers produced, unsorted.
#[derive(Debug, Default)]
pub struct CoordinatorOutcome {
    /// Emitted duplicate groups, in completion order
    pub groups: Vec<DuplicateGroup>,
    /// Files that failed to open or read
    pub failed: Vec<FailedFile>,
    /// Buckets fully processed
    pub buckets_processed: usize,
    /// Whether the shutdown flag cut the run short
    pub interrupted: bool,
}

/// The only state shared between bucket workers.
#[derive(Default)]
struct Shared {
    groups: Vec<DuplicateGroup>,
    failed: Vec<FailedFile>,
}

/// Runs the partitioner over every bucket.
pub struct ParallelCoordinator {
    concurrency: Concurrency,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ParallelCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelCoordinator")
            .field("concurrency", &self.concurrency)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ParallelCoordinator {
    /// Create a coordinator with the given concurrency.
    #[must_use]
    pub fn new(concurrency: Concurrency) -> Self {
        Self {
            concurrency,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Option<Arc<AtomicBool>>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Option<Arc<dyn ProgressCallback>>) -> Self {
        self.progress_callback = callback;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Partition every bucket and collect the results.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if a bounded worker pool cannot
    /// be created. Per-file failures never produce an error.
    pub fn run<S: ByteSource>(
        &self,
        buckets: BucketMap<S>,
    ) -> Result<CoordinatorOutcome, FinderError> {
        let buckets = buckets.into_buckets_largest_first();
        let total = buckets.len();
        let shared = Mutex::new(Shared::default());
        let completed = AtomicUsize::new(0);
        let interrupted = AtomicBool::new(false);

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_COMPARE, total);
        }
        log::info!(
            "Splitting {} length groups with {} worker(s)",
            total,
            self.concurrency.worker_count()
        );

        let work = |bucket: CandidateGroup<S>| {
            let length = bucket.length();
            if self.process_bucket(bucket, &shared) {
                interrupted.store(true, Ordering::SeqCst);
                return;
            }
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(done, &format!("{} byte files", length));
            }
        };

        match self.concurrency {
            Concurrency::Sequential => buckets.into_iter().for_each(work),
            Concurrency::Bounded(_) | Concurrency::Available => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.concurrency.worker_count())
                    .build()?;
                pool.install(|| buckets.into_par_iter().for_each(work));
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_COMPARE);
        }

        let Shared { groups, failed } = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(CoordinatorOutcome {
            groups,
            failed,
            buckets_processed: completed.into_inner(),
            interrupted: interrupted.into_inner(),
        })
    }

    /// Open, partition and publish one bucket. Returns true if interrupted.
    fn process_bucket<S: ByteSource>(&self, bucket: CandidateGroup<S>, shared: &Mutex<Shared>) -> bool {
        if self.is_shutdown_requested() {
            return true;
        }

        let length = bucket.length();
        if !bucket.has_duplicates() {
            log::trace!("Skipping unique length {}", length);
            return false;
        }

        let mut failed = Vec::new();
        let mut opened = Vec::with_capacity(bucket.len());
        for mut source in bucket.into_members() {
            match source.initialize_read() {
                Ok(()) => opened.push(source),
                Err(e) => {
                    log::warn!("Failed to open {}: {}", source.entry().path.display(), e);
                    failed.push(FailedFile::open(source.into_entry(), &e));
                }
            }
        }

        log::debug!(
            "Comparing {} files of {} bytes ({} failed to open)",
            opened.len(),
            length,
            failed.len()
        );

        let mut groups = Vec::new();
        let interrupted = {
            let mut partition = Partition::new(opened, length, |source: S, offset, e| {
                failed.push(FailedFile::read(source.into_entry(), offset, &e));
            });
            if let Some(ref flag) = self.shutdown_flag {
                partition = partition.with_shutdown_flag(Arc::clone(flag));
            }
            for members in partition.by_ref() {
                let files = members.into_iter().map(ByteSource::into_entry).collect();
                if let Some(group) = DuplicateGroup::try_new(length, files) {
                    groups.push(group);
                }
            }
            partition.is_interrupted()
        };

        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        guard.groups.append(&mut groups);
        guard.failed.append(&mut failed);
        interrupted
    }
}

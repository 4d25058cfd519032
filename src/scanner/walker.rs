//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct which traverses one or more
//! root directories and yields the regular files the comparison engine
//! should consider.
//!
//! # Features
//!
//! - Sorted, deterministic traversal of several roots
//! - Excluded directories are pruned, not merely filtered
//! - Regex include/exclude on file names
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max)
//! - One path per physical file, via [`HardlinkTracker`]
//! - Graceful shutdown via atomic flag
//!
//! Unreadable directories are reported as [`ScanError`] items and traversal
//! continues; callers decide whether to log or count them.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::hardlink::HardlinkTracker;
use super::{FileEntry, ScanError, WalkerConfig, MANIFEST_EXTENSION};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root paths to walk, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Canonical forms of the excluded directories
    canonical_excludes: Vec<PathBuf>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker over the given roots.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bytedupe::scanner::{Walker, WalkerConfig};
    /// use std::path::PathBuf;
    ///
    /// let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// ```
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        let canonical_excludes = config
            .exclude_dirs
            .iter()
            .filter_map(|d| d.canonicalize().ok())
            .collect();
        Self {
            roots,
            config,
            canonical_excludes,
            shutdown_flag: None,
            progress_callback: None,
        }
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

    /// Build gitignore matcher for one root from the configured patterns.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    fn should_ignore(
        root: &Path,
        path: &Path,
        is_dir: bool,
        gitignore: Option<&Gitignore>,
    ) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        gi.matched(normalized_path, is_dir).is_ignore()
    }

    fn is_excluded_dir(&self, path: &Path) -> bool {
        if self.config.exclude_dirs.iter().any(|d| d == path) {
            return true;
        }
        if self.canonical_excludes.is_empty() {
            return false;
        }
        path.canonicalize()
            .is_ok_and(|canonical| self.canonical_excludes.contains(&canonical))
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Check the file name against manifest, include and exclude rules.
    fn passes_name_filter(&self, path: &Path) -> bool {
        if !self.config.include_manifests
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
        {
            return false;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.config.include_patterns.is_empty()
            && !self
                .config
                .include_patterns
                .iter()
                .any(|re| re.is_match(&filename))
        {
            return false;
        }

        !self
            .config
            .exclude_patterns
            .iter()
            .any(|re| re.is_match(&filename))
    }

    /// Walk all roots, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Entries within a directory come out sorted by name.
    ///
    /// A file reachable through several paths (hardlinks, or followed
    /// symlinks) is yielded once, under the first path met.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut discovered = 0usize;
        let mut hardlink_tracker = HardlinkTracker::new();
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .filter_map(move |found| match found {
                Ok((entry, metadata)) => {
                    if hardlink_tracker.is_hardlink(&metadata) {
                        log::debug!("Skipping hardlink: {}", entry.path.display());
                        return None;
                    }
                    Some(Ok(entry))
                }
                Err(e) => Some(Err(e)),
            })
            .inspect(move |entry| {
                if let (Ok(file), Some(callback)) = (entry, self.progress_callback.as_ref()) {
                    discovered += 1;
                    callback.on_progress(discovered, file.path.to_string_lossy().as_ref());
                }
            })
    }

    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> Box<dyn Iterator<Item = Result<(FileEntry, Metadata), ScanError>> + 'a> {
        if !root.is_dir() {
            let err = if root.exists() {
                ScanError::NotADirectory(root.to_path_buf())
            } else {
                ScanError::NotFound(root.to_path_buf())
            };
            log::warn!("Skipping root: {}", err);
            return Box::new(std::iter::once(Err(err)));
        }

        let gitignore = self.build_gitignore(root);
        let file_gitignore = gitignore.clone();
        let walk_dir = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        let iter = walk_dir
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let path = entry.path();
                if self.is_excluded_dir(path) {
                    log::debug!("Excluding directory: {}", path.display());
                    return false;
                }
                if Self::should_ignore(root, path, true, gitignore.as_ref()) {
                    log::trace!("Ignoring directory: {}", path.display());
                    return false;
                }
                true
            })
            .map_while(move |entry| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return None;
                }
                Some(entry)
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() && !entry.path_is_symlink() {
                        return None;
                    }
                    let path = entry.path();
                    if entry.path_is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }
                    if Self::should_ignore(root, path, false, file_gitignore.as_ref()) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) => self.process_file_entry(path.to_path_buf(), metadata),
                        Err(e) => Some(Err(Self::convert_walkdir_error(root, e))),
                    }
                }
                Err(e) => Some(Err(Self::convert_walkdir_error(root, e))),
            });

        Box::new(iter)
    }

    /// Apply the file filters and build a FileEntry, keeping the metadata
    /// for the identity check.
    fn process_file_entry(
        &self,
        path: PathBuf,
        metadata: Metadata,
    ) -> Option<Result<(FileEntry, Metadata), ScanError>> {
        if !metadata.is_file() {
            return None;
        }

        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        if !self.passes_name_filter(&path) {
            log::trace!("Skipping file due to name filter: {}", path.display());
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().ok();

        let entry = FileEntry::new(path, size, modified).with_created(created);
        Some(Ok((entry, metadata)))
    }

    /// Convert a walkdir error into a ScanError, logging it.
    fn convert_walkdir_error(root: &Path, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| root.to_path_buf(), Path::to_path_buf);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("Path vanished during walk: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                ScanError::Io { path, source }
            }
        }
    }
}

//! Scanner module for file discovery and byte-level file access.
//!
//! This module provides functionality for:
//! - Sorted directory traversal using walkdir
//! - Include/exclude filtering (directories, regexes, gitignore-style globs)
//! - The [`ByteSource`] abstraction the comparison engine reads through
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hardlink`]: One path per physical file
//! - [`source`]: Byte-at-a-time readable files
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![Path::new(".").to_path_buf()], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
#[doc(hidden)]
pub mod memory;
pub mod source;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[doc(hidden)]
pub use memory::{MemorySource, SourceProbe};
pub use source::{ByteSource, FileSource, ReadError};
pub use walker::Walker;

/// Extension of duplicate manifests written by this tool.
///
/// Manifests are skipped during discovery unless explicitly included, so a
/// rescan does not report the manifest of a previous run.
pub const MANIFEST_EXTENSION: &str = "ccdup";

/// Metadata for a discovered file.
///
/// The size is captured once at discovery and is the read budget for the
/// comparison; it is never re-queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Creation time, where the platform reports one
    pub created: Option<SystemTime>,
}

impl FileEntry {
    /// Create a new FileEntry without a creation time.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            created: None,
        }
    }

    /// Attach a creation time.
    #[must_use]
    pub fn with_created(mut self, created: Option<SystemTime>) -> Self {
        self.created = created;
        self
    }

    /// File name component as a lossy string.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Containing directory, or an empty path for bare file names.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Configuration for directory walking.
///
/// Controls which discovered files are handed to the comparison engine.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Directories whose whole subtree is skipped.
    pub exclude_dirs: Vec<PathBuf>,

    /// File name patterns; when non-empty, at least one must match.
    pub include_patterns: Vec<Regex>,

    /// File name patterns; a file matching any of them is skipped.
    pub exclude_patterns: Vec<Regex>,

    /// Include `.ccdup` manifests from earlier runs.
    pub include_manifests: bool,
}

/// Errors that can occur during directory scanning.
///
/// These never reach the comparison engine; a failed directory simply
/// yields fewer files.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

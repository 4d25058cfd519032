//! Physical file identity for discovery.
//!
//! Two directory entries can name the same file: hardlinks share an inode,
//! and a followed symlink resolves to its target. Comparing such a pair
//! would prove a file identical to itself, so the walker keeps only the
//! first path it meets for each physical file.
//!
//! On Unix the identity is the `(device, inode)` pair from the metadata.
//! Other platforms do not expose it without opening the file, so every
//! entry is treated as distinct there.

use std::collections::HashSet;
use std::fs::Metadata;

/// Remembers the physical files already discovered.
///
/// Not thread-safe; the walker owns one per traversal.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Record `metadata` and report whether its file was seen before.
    ///
    /// Always `false` where the platform has no file identity.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }

    /// Number of distinct files recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether this platform can tell two paths to one file apart.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(unix), allow(dead_code))]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_distinct_files_not_hardlinks() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&fs::metadata(&a).unwrap()));
        assert!(!tracker.is_hardlink(&fs::metadata(&b).unwrap()));
        if HardlinkTracker::is_supported() {
            assert_eq!(tracker.seen_count(), 2);
        }
    }

    #[test]
    fn test_same_file_twice_is_hardlink() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, b"content").unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&fs::metadata(&a).unwrap()));
        assert_eq!(
            tracker.is_hardlink(&fs::metadata(&a).unwrap()),
            HardlinkTracker::is_supported()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_detected() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("original.bin");
        let link = dir.path().join("link.bin");
        fs::write(&original, b"shared inode").unwrap();
        fs::hard_link(&original, &link).unwrap();

        let mut tracker = HardlinkTracker::new();
        assert!(!tracker.is_hardlink(&fs::metadata(&original).unwrap()));
        assert!(tracker.is_hardlink(&fs::metadata(&link).unwrap()));
        assert_eq!(tracker.seen_count(), 1);
    }
}

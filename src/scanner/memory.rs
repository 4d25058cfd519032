//! In-memory byte sources for exercising the engine without a filesystem.
//!
//! [`MemorySource`] can be told to fail on open or at a given offset, and
//! shares a [`SourceProbe`] that counts opens, reads and finalizes. Tests
//! and benchmarks use them to observe the failure and cleanup paths.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use super::source::{ByteSource, ReadError};
use super::FileEntry;

/// Counters shared between a [`MemorySource`] and whoever inspects it.
#[derive(Debug, Default)]
pub struct SourceProbe {
    opens: AtomicUsize,
    reads: AtomicUsize,
    finalizes: AtomicUsize,
}

impl SourceProbe {
    /// Successful `initialize_read` calls.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// `read_byte_affirmative` calls, failed ones included.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// `finalize_read` calls.
    #[must_use]
    pub fn finalizes(&self) -> usize {
        self.finalizes.load(Ordering::SeqCst)
    }
}

/// An in-memory source with injectable failures.
#[derive(Debug)]
pub struct MemorySource {
    entry: FileEntry,
    content: Vec<u8>,
    cursor: usize,
    open: bool,
    fail_open: bool,
    fail_at: Option<u64>,
    probe: Arc<SourceProbe>,
}

impl MemorySource {
    /// Create a source whose declared length is the content length.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let entry = FileEntry::new(path.into(), content.len() as u64, SystemTime::UNIX_EPOCH);
        Self {
            entry,
            content,
            cursor: 0,
            open: false,
            fail_open: false,
            fail_at: None,
            probe: Arc::new(SourceProbe::default()),
        }
    }

    /// Make `initialize_read` fail.
    #[must_use]
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make the read of the byte at `offset` fail with an I/O error.
    #[must_use]
    pub fn with_read_failure_at(mut self, offset: u64) -> Self {
        self.fail_at = Some(offset);
        self
    }

    /// Override the declared length, e.g. to simulate a file that shrank.
    #[must_use]
    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.entry.size = length;
        self
    }

    /// Counters for this source.
    #[must_use]
    pub fn probe(&self) -> Arc<SourceProbe> {
        Arc::clone(&self.probe)
    }
}

impl ByteSource for MemorySource {
    fn entry(&self) -> &FileEntry {
        &self.entry
    }

    fn initialize_read(&mut self) -> io::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected open failure",
            ));
        }
        self.open = true;
        self.cursor = 0;
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_byte_affirmative(&mut self) -> Result<u8, ReadError> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if !self.open {
            return Err(ReadError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "source is not open",
            )));
        }
        if self.fail_at == Some(self.cursor as u64) {
            return Err(ReadError::Io(io::Error::other("injected read failure")));
        }
        let byte = *self.content.get(self.cursor).ok_or(ReadError::EndOfStream)?;
        self.cursor += 1;
        Ok(byte)
    }

    fn finalize_read(&mut self) {
        self.probe.finalizes.fetch_add(1, Ordering::SeqCst);
        self.open = false;
    }

    fn into_entry(self) -> FileEntry {
        self.entry
    }
}

//! Byte-at-a-time readable files.
//!
//! # Overview
//!
//! The comparison engine never hashes. It opens every same-length candidate,
//! reads them in lockstep one byte at a time and stops reading a file as soon
//! as no other candidate shares its prefix. [`ByteSource`] is the contract the
//! engine reads through:
//!
//! 1. [`ByteSource::initialize_read`] once, before any read
//! 2. [`ByteSource::read_byte_affirmative`] until the declared length is consumed
//! 3. [`ByteSource::finalize_read`] exactly once on every exit path
//!
//! [`FileSource`] is the filesystem implementation.

use std::fs::File;
use std::io::{self, BufReader, Read};
use super::FileEntry;

/// Buffer size for file reads.
///
/// Most same-length candidates diverge early, so a small buffer keeps the
/// bytes read past the point of disambiguation low.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Errors from a single byte read.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The source ended before its declared length was consumed.
    #[error("unexpected end of stream")]
    EndOfStream,

    /// The underlying read failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// A readable file of known length.
///
/// Calling [`read_byte_affirmative`](ByteSource::read_byte_affirmative)
/// before a successful `initialize_read`, after a failed read, or after
/// `finalize_read` is a caller error.
pub trait ByteSource: Send {
    /// Discovery metadata for this source.
    fn entry(&self) -> &FileEntry;

    /// Declared length, captured at discovery. This is the read budget.
    fn length(&self) -> u64 {
        self.entry().size
    }

    /// Open the source for reading.
    ///
    /// # Errors
    ///
    /// Returns the open error (permission denied, vanished, locked). The
    /// source holds no resource afterwards.
    fn initialize_read(&mut self) -> io::Result<()>;

    /// Read the next byte.
    ///
    /// # Errors
    ///
    /// [`ReadError::EndOfStream`] when the source is shorter than expected,
    /// [`ReadError::Io`] for any other failure.
    fn read_byte_affirmative(&mut self) -> Result<u8, ReadError>;

    /// Release the underlying resource. Idempotent.
    fn finalize_read(&mut self);

    /// Give back the discovery metadata, consuming the source.
    fn into_entry(self) -> FileEntry
    where
        Self: Sized;
}

/// A file on disk read through a small buffer.
#[derive(Debug)]
pub struct FileSource {
    entry: FileEntry,
    reader: Option<BufReader<File>>,
}

impl FileSource {
    /// Create a source for a discovered file. Nothing is opened yet.
    #[must_use]
    pub fn new(entry: FileEntry) -> Self {
        Self {
            entry,
            reader: None,
        }
    }

    /// Whether a reader is currently held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }
}

impl From<FileEntry> for FileSource {
    fn from(entry: FileEntry) -> Self {
        Self::new(entry)
    }
}

impl ByteSource for FileSource {
    fn entry(&self) -> &FileEntry {
        &self.entry
    }

    fn initialize_read(&mut self) -> io::Result<()> {
        debug_assert!(self.reader.is_none(), "source opened twice");
        let file = File::open(&self.entry.path)?;
        self.reader = Some(BufReader::with_capacity(READ_BUFFER_SIZE, file));
        Ok(())
    }

    fn read_byte_affirmative(&mut self) -> Result<u8, ReadError> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            ReadError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "source is not open",
            ))
        })?;

        let mut byte = [0u8; 1];
        loop {
            match reader.read(&mut byte) {
                Ok(0) => return Err(ReadError::EndOfStream),
                Ok(_) => return Ok(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::Io(e)),
            }
        }
    }

    fn finalize_read(&mut self) {
        self.reader = None;
    }

    fn into_entry(self) -> FileEntry {
        self.entry
    }
}

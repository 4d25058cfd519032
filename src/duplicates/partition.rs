//! Byte-synchronized partitioning of same-length files.
//!
//! # Overview
//!
//! [`Partition`] takes a set of opened [`ByteSource`]s that share a declared
//! length and lazily yields the maximal subsets whose contents are identical.
//!
//! All members of a work item are read one byte at a time, in lockstep:
//!
//! - while every member reads the same byte, the item stays undivided
//! - when bytes differ, the item splits by byte value; partitions of two or
//!   more continue from the same offset, single members are finalized and
//!   never read again
//! - a member whose read fails is finalized, handed to the failure callback
//!   and removed; the others keep the bytes already compared
//! - an item that consumes the whole length with two or more members is
//!   emitted as a group
//!
//! Sub-partitions live on an explicit stack, so arbitrarily deep splitting
//! never grows the call stack.
//!
//! # Ordering
//!
//! Members are read in insertion order, so several failures at one offset
//! are reported in insertion order. Partitions are visited in order of the
//! first member holding each byte value, and members of an emitted group keep
//! their insertion order.
//!
//! # Resources
//!
//! Every source passed in is finalized exactly once before it leaves the
//! partitioner, whether it is emitted, reported as failed, eliminated as a
//! singleton, or still pending when the iterator is dropped or cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::scanner::{ByteSource, ReadError};

struct WorkItem<S> {
    members: Vec<S>,
    remaining: u64,
}

/// Lazy iterator over byte-identical groups of one bucket.
///
/// # Example
///
/// ```
/// use bytedupe::duplicates::Partition;
/// use bytedupe::scanner::{ByteSource, MemorySource};
///
/// let mut sources = vec![
///     MemorySource::new("/a", b"abc".to_vec()),
///     MemorySource::new("/b", b"abc".to_vec()),
///     MemorySource::new("/c", b"abd".to_vec()),
/// ];
/// for s in &mut sources {
///     s.initialize_read().unwrap();
/// }
///
/// let groups: Vec<_> = Partition::new(sources, 3, |_, _, _| {}).collect();
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].len(), 2);
/// ```
pub struct Partition<S: ByteSource, F> {
    length: u64,
    stack: Vec<WorkItem<S>>,
    bytes: Vec<u8>,
    on_failed: F,
    shutdown_flag: Option<Arc<AtomicBool>>,
    interrupted: bool,
}

impl<S, F> Partition<S, F>
where
    S: ByteSource,
    F: FnMut(S, u64, ReadError),
{
    /// Start partitioning `members`, all already opened and of declared
    /// length `length`.
    ///
    /// `on_failed` receives each source whose read fails, already finalized,
    /// with the number of bytes it had read before the failure.
    pub fn new(members: Vec<S>, length: u64, on_failed: F) -> Self {
        let mut stack = Vec::new();
        if members.len() >= 2 {
            stack.push(WorkItem {
                members,
                remaining: length,
            });
        } else {
            finalize_all(members);
        }
        Self {
            length,
            stack,
            bytes: Vec::new(),
            on_failed,
            shutdown_flag: None,
            interrupted: false,
        }
    }

    /// Stop at the next step once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Whether iteration stopped because of the shutdown flag.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Read one byte from every member, dropping the ones that fail.
    fn read_column(&mut self, members: &mut Vec<S>, offset: u64) {
        self.bytes.clear();
        let mut i = 0;
        while i < members.len() {
            match members[i].read_byte_affirmative() {
                Ok(byte) => {
                    self.bytes.push(byte);
                    i += 1;
                }
                Err(e) => {
                    let mut failed = members.remove(i);
                    failed.finalize_read();
                    log::warn!(
                        "Failed to read {} at offset {}: {}",
                        failed.entry().path.display(),
                        offset,
                        e
                    );
                    (self.on_failed)(failed, offset, e);
                }
            }
        }
    }

    /// Split `members` by the bytes just read and queue the survivors.
    fn split(&mut self, members: Vec<S>, remaining: u64) {
        let mut partitions: Vec<(u8, Vec<S>)> = Vec::new();
        for (member, &byte) in members.into_iter().zip(self.bytes.iter()) {
            match partitions.iter_mut().find(|(value, _)| *value == byte) {
                Some((_, partition)) => partition.push(member),
                None => partitions.push((byte, vec![member])),
            }
        }

        log::trace!(
            "Split into {} partitions with {} bytes remaining",
            partitions.len(),
            remaining
        );

        // Reversed so the first partition is popped first.
        for (_, partition) in partitions.into_iter().rev() {
            if partition.len() >= 2 {
                self.stack.push(WorkItem {
                    members: partition,
                    remaining,
                });
            } else {
                finalize_all(partition);
            }
        }
    }

    /// Drive one work item until it is emitted, split or exhausted.
    fn process(&mut self, mut item: WorkItem<S>) -> Option<Vec<S>> {
        loop {
            if item.members.len() < 2 {
                finalize_all(item.members);
                return None;
            }
            if item.remaining == 0 {
                let mut group = item.members;
                for member in &mut group {
                    member.finalize_read();
                }
                return Some(group);
            }

            let offset = self.length - item.remaining;
            item.remaining -= 1;
            self.read_column(&mut item.members, offset);

            if item.members.len() < 2 {
                finalize_all(item.members);
                return None;
            }

            let first = self.bytes[0];
            if self.bytes.iter().any(|&b| b != first) {
                self.split(item.members, item.remaining);
                return None;
            }
        }
    }

    fn abandon(&mut self) {
        for item in self.stack.drain(..) {
            finalize_all(item.members);
        }
    }
}

impl<S, F> Iterator for Partition<S, F>
where
    S: ByteSource,
    F: FnMut(S, u64, ReadError),
{
    type Item = Vec<S>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.stack.pop() {
            if self.is_shutdown_requested() {
                log::debug!("Partition: Shutdown requested, releasing pending files");
                self.interrupted = true;
                finalize_all(item.members);
                self.abandon();
                return None;
            }
            if let Some(group) = self.process(item) {
                return Some(group);
            }
        }
        None
    }
}

impl<S: ByteSource, F> Drop for Partition<S, F> {
    fn drop(&mut self) {
        for item in self.stack.drain(..) {
            finalize_all(item.members);
        }
    }
}

fn finalize_all<S: ByteSource>(members: Vec<S>) {
    for mut member in members {
        member.finalize_read();
    }
}

//! Shardline netcore - per-connection I/O plumbing
//!
//! Holds the bounded queue of result chunks a frontend connection writes back
//! to its client. Data nodes answer a fanned-out statement in parallel; the
//! connection enqueues each answer and a writer loop drains them. A full queue
//! fails at once and never blocks or waits for room; the caller aborts the
//! query on overflow.

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use std::collections::vec_deque::Drain;
use thiserror::Error;

/// Returned by [`BoundedResultBuffer::enqueue`] when the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("result buffer full: {size} of {capacity} chunks queued")]
pub struct BufferOverflow {
    pub capacity: usize,
    pub size: usize,
}

/// Fixed-capacity FIFO of result chunks.
///
/// Owned by one connection; nothing here is synchronized. An extra
/// attachment slot holds a chunk that is still being filled and does not
/// count towards [`size`](Self::size).
#[derive(Debug)]
pub struct BoundedResultBuffer {
    queue: VecDeque<Bytes>,
    capacity: usize,
    attachment: Option<BytesMut>,
}

impl BoundedResultBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            attachment: None,
        }
    }

    /// Append a chunk, or fail without blocking when the buffer is full
    pub fn enqueue(&mut self, chunk: Bytes) -> Result<(), BufferOverflow> {
        if self.queue.len() >= self.capacity {
            return Err(BufferOverflow {
                capacity: self.capacity,
                size: self.queue.len(),
            });
        }
        self.queue.push_back(chunk);
        Ok(())
    }

    /// Oldest queued chunk
    pub fn dequeue(&mut self) -> Option<Bytes> {
        self.queue.pop_front()
    }

    /// Queued chunks in FIFO order; the buffer is empty afterwards
    pub fn drain(&mut self) -> Drain<'_, Bytes> {
        self.queue.drain(..)
    }

    /// Store a partial chunk, returning the one it replaces
    pub fn attach(&mut self, chunk: BytesMut) -> Option<BytesMut> {
        self.attachment.replace(chunk)
    }

    pub fn attachment(&self) -> Option<&BytesMut> {
        self.attachment.as_ref()
    }

    pub fn attachment_mut(&mut self) -> Option<&mut BytesMut> {
        self.attachment.as_mut()
    }

    pub fn take_attachment(&mut self) -> Option<BytesMut> {
        self.attachment.take()
    }

    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Free slots
    pub fn remaining(&self) -> usize {
        self.capacity - self.queue.len()
    }
}

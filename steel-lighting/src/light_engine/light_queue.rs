//! FIFO queues of packed positions built from pooled fixed-size segments.
//!
//! A drain touches millions of entries in the worst case, so segments are
//! recycled through a pool shared by every queue of one engine instead of
//! being reallocated on each pass.

use std::{collections::VecDeque, fmt, sync::Arc};

use parking_lot::Mutex;

/// Entries per segment.
pub const SEGMENT_LEN: usize = 1024;

/// Spare segments a pool keeps before freeing returned ones.
pub const DEFAULT_POOL_LIMIT: usize = 4096;

/// A fixed-size chunk of queue storage.
pub struct Segment {
    data: [u64; SEGMENT_LEN],
    len: usize,
}

impl Segment {
    fn new() -> Box<Self> {
        Box::new(Self {
            data: [0; SEGMENT_LEN],
            len: 0,
        })
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len == SEGMENT_LEN
    }

    #[inline]
    fn push(&mut self, value: u64) {
        self.data[self.len] = value;
        self.len += 1;
    }
}

/// Shared store of spare segments.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct SegmentPool {
    spare: Arc<Mutex<Vec<Box<Segment>>>>,
    limit: usize,
}

impl SegmentPool {
    /// Creates an empty pool keeping at most [`DEFAULT_POOL_LIMIT`] spare segments.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_POOL_LIMIT)
    }

    /// Creates an empty pool keeping at most `limit` spare segments.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            spare: Arc::new(Mutex::new(Vec::new())),
            limit,
        }
    }

    /// Creates an empty queue drawing from this pool.
    #[must_use]
    pub fn queue(&self) -> SegmentedQueue {
        SegmentedQueue {
            segments: VecDeque::new(),
            len: 0,
            pool: self.clone(),
        }
    }

    /// Number of spare segments currently held.
    #[must_use]
    pub fn spare_segments(&self) -> usize {
        self.spare.lock().len()
    }

    fn acquire(&self) -> Box<Segment> {
        match self.spare.lock().pop() {
            Some(mut segment) => {
                segment.len = 0;
                segment
            }
            None => Segment::new(),
        }
    }

    fn release(&self, segment: Box<Segment>) {
        let mut spare = self.spare.lock();
        if spare.len() < self.limit {
            spare.push(segment);
        }
    }
}

impl Default for SegmentPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SegmentPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentPool")
            .field("spare", &self.spare_segments())
            .field("limit", &self.limit)
            .finish()
    }
}

/// An append-only FIFO of `u64` entries.
///
/// Not synchronized; the owning engine serializes access. Consuming the
/// queue with [`IntoIterator`] hands segments back to the pool as soon as
/// they are exhausted.
pub struct SegmentedQueue {
    segments: VecDeque<Box<Segment>>,
    len: usize,
    pool: SegmentPool,
}

impl SegmentedQueue {
    /// Appends an entry, pulling a new segment only when the tail is full.
    #[inline]
    pub fn add(&mut self, value: u64) {
        if self.segments.back().is_none_or(|tail| tail.is_full()) {
            self.segments.push_back(self.pool.acquire());
        }
        if let Some(tail) = self.segments.back_mut() {
            tail.push(value);
            self.len += 1;
        }
    }

    /// Number of queued entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no entries.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves every entry into a new queue, leaving this one empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            segments: std::mem::take(&mut self.segments),
            len: std::mem::replace(&mut self.len, 0),
            pool: self.pool.clone(),
        }
    }

    /// Drops every entry, returning the segments to the pool.
    pub fn clear(&mut self) {
        for segment in self.segments.drain(..) {
            self.pool.release(segment);
        }
        self.len = 0;
    }
}

impl Drop for SegmentedQueue {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for SegmentedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedQueue")
            .field("len", &self.len)
            .field("segments", &self.segments.len())
            .finish()
    }
}

impl IntoIterator for SegmentedQueue {
    type Item = u64;
    type IntoIter = QueueIter;

    fn into_iter(mut self) -> Self::IntoIter {
        self.len = 0;
        QueueIter {
            segments: std::mem::take(&mut self.segments),
            current: None,
            index: 0,
            pool: self.pool.clone(),
        }
    }
}

/// Consuming iterator over a [`SegmentedQueue`].
pub struct QueueIter {
    segments: VecDeque<Box<Segment>>,
    current: Option<Box<Segment>>,
    index: usize,
    pool: SegmentPool,
}

impl Iterator for QueueIter {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        loop {
            if let Some(segment) = &self.current {
                if self.index < segment.len {
                    let value = segment.data[self.index];
                    self.index += 1;
                    return Some(value);
                }
            }

            if let Some(spent) = self.current.take() {
                self.pool.release(spent);
            }
            self.current = Some(self.segments.pop_front()?);
            self.index = 0;
        }
    }
}

impl Drop for QueueIter {
    fn drop(&mut self) {
        if let Some(segment) = self.current.take() {
            self.pool.release(segment);
        }
        for segment in self.segments.drain(..) {
            self.pool.release(segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let pool = SegmentPool::new();
        let mut queue = pool.queue();
        for value in 0..3000u64 {
            queue.add(value);
        }
        assert_eq!(queue.len(), 3000);
        assert!(!queue.is_empty());

        let drained: Vec<u64> = queue.into_iter().collect();
        assert_eq!(drained.len(), 3000);
        assert!(drained.iter().copied().eq(0..3000u64));
    }

    #[test]
    fn test_segments_return_to_pool() {
        let pool = SegmentPool::new();
        let mut queue = pool.queue();
        for value in 0..(SEGMENT_LEN as u64 * 2 + 1) {
            queue.add(value);
        }
        assert_eq!(pool.spare_segments(), 0);

        let count = queue.into_iter().count();
        assert_eq!(count, SEGMENT_LEN * 2 + 1);
        assert_eq!(pool.spare_segments(), 3);

        let mut reused = pool.queue();
        reused.add(7);
        assert_eq!(pool.spare_segments(), 2);
        assert_eq!(reused.into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_take_leaves_empty_queue() {
        let pool = SegmentPool::new();
        let mut queue = pool.queue();
        queue.add(1);
        queue.add(2);

        let taken = queue.take();
        assert!(queue.is_empty());
        assert_eq!(taken.len(), 2);

        queue.add(3);
        assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(queue.into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_partial_iteration_releases_segments() {
        let pool = SegmentPool::new();
        let mut queue = pool.queue();
        for value in 0..(SEGMENT_LEN as u64 + 10) {
            queue.add(value);
        }
        let mut iter = queue.into_iter();
        assert_eq!(iter.next(), Some(0));
        drop(iter);
        assert_eq!(pool.spare_segments(), 2);
    }

    #[test]
    fn test_pool_limit() {
        let pool = SegmentPool::with_limit(1);
        let mut queue = pool.queue();
        for value in 0..(SEGMENT_LEN as u64 * 3) {
            queue.add(value);
        }
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(pool.spare_segments(), 1);
    }
}

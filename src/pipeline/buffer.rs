//! Bounded buffer that keeps only the newest items.

use std::collections::VecDeque;

/// Fixed-capacity FIFO. Pushing onto a full buffer evicts the oldest item.
#[derive(Debug, Clone)]
pub struct RecentBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RecentBuffer<T> {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        RecentBuffer {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a full buffer from `items`, keeping the last `capacity` of them.
    pub fn filled<I: IntoIterator<Item = T>>(capacity: usize, items: I) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.extend(items);
        buffer
    }

    /// Append an item, returning the evicted one if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Remove and return every item, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T> Extend<T> for RecentBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

// bounded FIFO storage for buffered events.
//
// this is an externally-safe, not-itself-concurrent data structure: push and
// pop never block and never fail, but callers must provide mutual exclusion.
// keeping synchronization out of the queue is what lets the channel swap
// capacity or policy by constructing a fresh queue and draining into it,
// rather than mutating queue internals under partial locks.

use std::collections::{vec_deque, VecDeque};


// cap on eager allocation for bounded queues, so a large configured capacity
// doesn't reserve memory before any event arrives.
const PREALLOC_MAX: usize = 1024;

/// Rule for which item is dropped when a bounded queue is full
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OverflowPolicy {
    /// Evict the oldest buffered item to make room for the incoming one
    DiscardOldest,
    /// Drop the incoming item and leave the queue unchanged
    DiscardNewest,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::DiscardOldest
    }
}

/// Bounded FIFO with a fixed overflow policy, selected at construction
///
/// Not thread-safe by itself; the owning channel wraps it in a lock. A
/// capacity of 0 means unbounded.
pub struct EventQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T> EventQueue<T> {
    /// Construct empty with the given capacity (0 = unbounded) and policy
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        EventQueue {
            items: VecDeque::with_capacity(capacity.min(PREALLOC_MAX)),
            capacity,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Push to back, applying the overflow policy if the queue is full
    ///
    /// Never blocks and never fails; on overflow one item (the head or the
    /// incoming one, per policy) is silently discarded.
    pub fn push(&mut self, item: T) {
        if self.capacity != 0 && self.items.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::DiscardOldest => {
                    self.items.pop_front();
                }
                OverflowPolicy::DiscardNewest => return,
            }
        }
        self.items.push_back(item);
    }

    /// Pop from front, or `None` if no item is buffered
    ///
    /// An empty queue is an expected outcome, not an error.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }
}

impl<T> IntoIterator for EventQueue<T> {
    type Item = T;
    type IntoIter = vec_deque::IntoIter<T>;

    /// Consume the queue front-to-back, in arrival order
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

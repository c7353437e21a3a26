//! Work queues: thread-safe FIFOs decoupling console input, transmission and
//! printing.
//!
//! Each queue owns its own lock; the node's three queues never share one.
//! Every queue has exactly one consumer. Consumers should prefer
//! [`WorkQueue::try_pop`] or [`WorkQueue::pop_timeout`], which check and pop
//! under a single lock acquisition.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("pop on empty {queue} queue")]
    Empty { queue: &'static str },
}

/// Unbounded FIFO queue.
#[derive(Debug)]
pub struct WorkQueue<T = String> {
    name: &'static str,
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> WorkQueue<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Append to the tail. Never fails.
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.ready.notify_one();
    }

    /// Remove from the head. Calling this on an empty queue is a caller bug.
    pub fn pop(&self) -> Result<T, QueueError> {
        self.try_pop()
            .ok_or(QueueError::Empty { queue: self.name })
    }

    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Pop the head, waiting up to `timeout` for an item to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.ready.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    /// Take everything currently queued, in order.
    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }
}

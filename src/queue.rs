//! Thread-safe, optionally-bounded FIFO queue for multi-producer,
//! single-consumer work hand-off.
//!
//! # Overview
//!
//! - Producers call [`WorkQueue::try_put`] or [`WorkQueue::put`]; admission
//!   respects the capacity bound, with blocked producers polling for space.
//! - The single consumer calls [`WorkQueue::try_get`] or [`WorkQueue::get`];
//!   the blocking variant waits on a counting semaphore rather than spinning.
//! - Items come out in the exact order they were admitted.
//!
//! Single consumer is a usage contract, not an enforced invariant: the queue
//! stays memory-safe with multiple consumers, but FIFO and no-duplication
//! guarantees are only specified for one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use handoff::queue::WorkQueue;
//! use handoff::Timeout;
//!
//! let queue = WorkQueue::new(2);
//!
//! queue.try_put(1).unwrap();
//! queue.try_put(2).unwrap();
//! assert!(queue.try_put(3).is_err()); // at capacity
//!
//! assert_eq!(queue.get(Timeout::Duration(Duration::from_millis(10))), Ok(1));
//! assert_eq!(queue.try_get(), Ok(2));
//! assert!(queue.try_get().is_err()); // empty
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use minstant::Instant;
use thiserror::Error;
use tracing::{debug, trace};

use crate::sync::semaphore::{Semaphore, Timeout};

/// Sleep quantum used by a capacity-blocked `put` while waiting for space.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The queue was at capacity and no space freed within the requested
/// blocking policy. Carries the rejected item back to the caller for retry.
///
/// This is a control-flow signal for retry or backoff, not a defect; a failed
/// put leaves the queue unchanged.
#[derive(Error)]
#[error("queue is full")]
pub struct Full<T>(pub T);

// Payload-agnostic Debug so `Full<T>` is an error type for any `T`.
impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

/// The queue had no item within the requested blocking policy.
///
/// Like [`Full`], a recoverable control-flow signal; a failed get leaves the
/// queue unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue is empty")]
pub struct Empty;

/// Thread-safe FIFO queue handing work items to a single consumer.
///
/// Storage is a `Mutex<VecDeque>`; item availability is signaled through a
/// counting semaphore so the consumer gets a real blocking wait. An item is
/// appended to storage before its permit is released, so a consumer that wins
/// a permit always finds the item present.
///
/// Capacity enforcement is best-effort: the occupancy check and the append
/// are not a single atomic step, so concurrent producers racing past the
/// check can transiently overshoot the bound. The diagnostics ([`len`],
/// [`is_empty`], [`is_full`]) are advisory for the same reason.
///
/// [`len`]: WorkQueue::len
/// [`is_empty`]: WorkQueue::is_empty
/// [`is_full`]: WorkQueue::is_full
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    count: Semaphore,
}

impl<T> WorkQueue<T> {
    /// Creates a queue with the given capacity. A capacity of `0` means
    /// unbounded.
    ///
    /// The capacity is fixed for the lifetime of the queue.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity,
            count: Semaphore::new(0),
        }
    }

    /// Creates an unbounded queue. Equivalent to `new(0)`.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(0)
    }

    /// Returns the configured capacity; `0` means unbounded.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Attempts to admit an item without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] carrying the item back if the queue is bounded and at
    /// capacity.
    pub fn try_put(&self, item: T) -> Result<(), Full<T>> {
        if self.capacity > 0 && self.len() >= self.capacity {
            return Err(Full(item));
        }
        self.push(item);
        Ok(())
    }

    /// Admits an item, polling for space while the queue is at capacity.
    ///
    /// Bounded queues at capacity re-check occupancy every [`POLL_INTERVAL`],
    /// sleeping at most `min(POLL_INTERVAL, time_remaining)` per round when a
    /// deadline is set. Unbounded queues admit unconditionally.
    ///
    /// A zero-duration timeout behaves like [`try_put`](WorkQueue::try_put).
    ///
    /// # Errors
    ///
    /// Returns [`Full`] carrying the item back if the deadline passes before
    /// space frees. A timed-out put leaves the queue exactly as if the call
    /// had not been attempted.
    pub fn put(&self, item: T, timeout: Timeout) -> Result<(), Full<T>> {
        if self.capacity > 0 && self.len() >= self.capacity {
            trace!(capacity = self.capacity, "queue at capacity, polling for space");
            let deadline = match timeout {
                Timeout::Infinite => None,
                Timeout::Duration(d) => Some(Instant::now() + d),
            };
            while self.len() >= self.capacity {
                match deadline {
                    None => thread::sleep(POLL_INTERVAL),
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(Full(item));
                        }
                        thread::sleep(POLL_INTERVAL.min(deadline.duration_since(now)));
                    }
                }
            }
        }
        self.push(item);
        Ok(())
    }

    /// Attempts to retrieve the oldest item without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Empty`] if no item is available.
    pub fn try_get(&self) -> Result<T, Empty> {
        if !self.count.try_acquire() {
            return Err(Empty);
        }
        self.pop().ok_or(Empty)
    }

    /// Retrieves the oldest item, blocking until one is available or the
    /// timeout elapses.
    ///
    /// This is a condition-variable wait on the availability semaphore, not a
    /// spin loop. Only the single contracted consumer should call this.
    ///
    /// # Errors
    ///
    /// Returns [`Empty`] if no item became available within the timeout. A
    /// timed-out get leaves the queue unchanged.
    pub fn get(&self, timeout: Timeout) -> Result<T, Empty> {
        if !self.count.acquire(timeout) {
            return Err(Empty);
        }
        self.pop().ok_or(Empty)
    }

    /// Returns `true` if the queue currently holds no items.
    ///
    /// Advisory only: not linearizable with concurrent producers/consumer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the queue is bounded and at (or beyond) capacity.
    ///
    /// Unbounded queues are never full. Advisory only.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.len() >= self.capacity
    }

    /// Returns the current occupancy estimate. Advisory only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Discards all pending items and resynchronizes the availability signal
    /// down to zero.
    ///
    /// The queue remains usable afterwards. Producers racing with `clear` may
    /// have an in-flight item counted inconsistently; this is an accepted
    /// hazard of the advisory occupancy model.
    pub fn clear(&self) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let drained = self.count.drain();
        debug!(drained, "cleared pending work items");
    }

    /// Appends the item, then releases its permit. Storage visibility
    /// happens-before the signal: the append completes under the items lock
    /// before the semaphore is touched.
    fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.count.release();
    }

    /// Pops the oldest item. `None` only when a `clear` raced away an item
    /// whose permit was already won; callers surface that as [`Empty`].
    fn pop(&self) -> Option<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

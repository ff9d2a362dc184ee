//! Counting semaphore with blocking, non-blocking, and timeout-bounded
//! acquisition.
//!
//! One permit is released per unit of work made available; acquiring consumes
//! one permit, blocking on a condition variable when none are available. This
//! is a true OS-level wait, not a spin loop: the intended waiter is a single
//! consumer thread that may sleep for a long time between items.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use minstant::Instant;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// A counting semaphore over `Mutex<usize>` + `Condvar`.
///
/// Wakeups use `notify_one`: the usage contract is a single waiting consumer,
/// so there is no thundering-herd or missed-broadcast concern.
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with the given initial permit count.
    #[must_use]
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Releases one permit and wakes a waiter, if any.
    pub fn release(&self) {
        let mut permits = self
            .permits
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *permits += 1;
        self.available.notify_one();
    }

    /// Attempts to consume one permit without blocking.
    ///
    /// Returns `false` if no permit is available.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut permits = self
            .permits
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *permits > 0 {
            *permits -= 1;
            true
        } else {
            false
        }
    }

    /// Consumes one permit, blocking until one is available or the timeout
    /// elapses.
    ///
    /// Returns `false` on timeout. Spurious wakeups re-check the permit count
    /// and the deadline, so the wait never returns early with `true` and
    /// never sleeps past the deadline by more than scheduler jitter.
    #[must_use]
    pub fn acquire(&self, timeout: Timeout) -> bool {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };
        let mut permits = self
            .permits
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *permits > 0 {
                *permits -= 1;
                return true;
            }
            permits = match deadline {
                None => self
                    .available
                    .wait(permits)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.available
                        .wait_timeout(permits, deadline.duration_since(now))
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Consumes all currently available permits without blocking.
    ///
    /// Returns the number of permits drained. Equivalent to repeated
    /// non-blocking acquires until none remain, done under a single lock.
    pub fn drain(&self) -> usize {
        let mut permits = self
            .permits
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *permits)
    }
}

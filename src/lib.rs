//! Thread-safe hand-off of work items between producer threads and a single
//! consumer thread.
//!
//! The core type is [`WorkQueue`]: an optionally-bounded FIFO queue where any
//! number of producers push items and exactly one consumer pops them, with
//! blocking, non-blocking, and timeout-bounded variants of both operations.
//!
//! # Overview
//!
//! - [`WorkQueue`] - the bounded signaling queue
//! - [`Timeout`] - timeout specification shared by all blocking operations
//! - [`cache::TtlCache`] - TTL-memoized computed values
//! - [`trace`] - one-shot process logging bootstrap
//!
//! # Example
//!
//! ```
//! use handoff::{Timeout, WorkQueue};
//!
//! let queue = WorkQueue::new(4);
//!
//! // Producer thread
//! queue.try_put("job").expect("queue full");
//!
//! // Consumer thread
//! assert_eq!(queue.get(Timeout::Infinite), Ok("job"));
//! ```

pub mod cache;
pub mod queue;
pub mod sync;
pub mod trace;

#[doc(inline)]
pub use queue::{Empty, Full, WorkQueue};

#[doc(inline)]
pub use sync::semaphore::Timeout;

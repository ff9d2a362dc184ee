//! Synchronization primitives for in-process communication.
//!
//! This module provides the counting-signal primitive used by
//! [`crate::queue::WorkQueue`] to let its consumer block efficiently until
//! work is available.

pub mod semaphore;

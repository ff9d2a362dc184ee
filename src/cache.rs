//! TTL-memoized computed values.
//!
//! [`TtlCache`] holds named computed values alongside the instant they were
//! last computed. An accessor recomputes on first access or once the TTL has
//! elapsed, and individual entries can be invalidated explicitly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use handoff::cache::TtlCache;
//!
//! let cache: TtlCache<u64> = TtlCache::new(Duration::from_secs(600));
//!
//! // Computed once, then served from cache for ten minutes.
//! let value = cache.get_or_compute("expensive", || 42);
//! assert_eq!(value, 42);
//! assert_eq!(cache.get_or_compute("expensive", || unreachable!()), 42);
//!
//! // Force recomputation on next access.
//! assert!(cache.invalidate("expensive"));
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use minstant::Instant;

struct Entry<V> {
    value: V,
    computed_at: Instant,
}

/// Named cache of computed values with a shared time-to-live.
///
/// A TTL of [`Duration::ZERO`] means entries never expire and are only
/// recomputed after explicit invalidation.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<&'static str, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache whose entries stay fresh for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `name`, recomputing it with `compute`
    /// when absent or stale.
    ///
    /// The computation runs under the cache lock; concurrent accessors of
    /// other entries block for its duration.
    pub fn get_or_compute(&self, name: &'static str, compute: impl FnOnce() -> V) -> V {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(name)
            && (self.ttl.is_zero() || entry.computed_at.elapsed() <= self.ttl)
        {
            return entry.value.clone();
        }
        let value = compute();
        entries.insert(
            name,
            Entry {
                value: value.clone(),
                computed_at: Instant::now(),
            },
        );
        value
    }

    /// Removes the cached entry for `name`, forcing the next access to
    /// recompute. Returns `true` if an entry was present.
    pub fn invalidate(&self, name: &'static str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Drops all cached entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

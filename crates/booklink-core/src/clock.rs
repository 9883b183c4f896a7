//! Time sources.
//!
//! Every registry reads time through a [`Clock`] so expiry can be driven
//! deterministically in tests. Timestamps are Unix milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds per second.
pub const MILLIS_PER_SEC: i64 = 1_000;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix time in milliseconds (UTC).
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            // Clock set before 1970.
            Err(before) => -(before.duration().as_millis() as i64),
        }
    }
}

/// A manually driven clock for tests.
///
/// Starts at the current wall-clock time unless created with [`MockClock::at`].
#[derive(Debug)]
pub struct MockClock {
    now: AtomicI64,
}

impl MockClock {
    /// Create a mock clock frozen at the current wall-clock time.
    pub fn new() -> Self {
        Self::at(SystemClock.now_millis())
    }

    /// Create a mock clock frozen at `millis`.
    pub fn at(millis: i64) -> Self {
        Self {
            now: AtomicI64::new(millis),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Move time forward (or backward, for negative values) by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * MILLIS_PER_SEC);
    }

    /// Move time by milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Whether an item created at `created_at` has outlived `lifetime_secs` at `now`.
///
/// The comparison is strict: an item is still valid at the exact boundary instant.
pub fn is_expired(created_at: i64, lifetime_secs: u64, now: i64) -> bool {
    let lifetime = i64::try_from(lifetime_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(MILLIS_PER_SEC);
    now.saturating_sub(created_at) > lifetime
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::at(1_000);
        clock.advance_secs(2);
        assert_eq!(clock.now_millis(), 3_000);
        clock.advance_millis(-500);
        assert_eq!(clock.now_millis(), 2_500);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        assert!(!is_expired(0, 10, 10_000)); // exactly at the boundary
        assert!(is_expired(0, 10, 10_001));
        assert!(!is_expired(0, 0, 0));
        assert!(is_expired(0, 0, 1));
    }

    #[test]
    fn test_expiry_does_not_overflow() {
        assert!(!is_expired(i64::MIN, u64::MAX, i64::MAX));
    }
}

//! Deterministic effect handlers.

use bulletin_core::{Clock, IdGenerator};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Clock frozen at `time`.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(time),
        }
    }

    /// Clock frozen at an RFC 3339 timestamp. Panics on a malformed string.
    pub fn at(rfc3339: &str) -> Self {
        Self::new(crate::fixtures::ts(rfc3339))
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Ids `prefix-1`, `prefix-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    /// Start a sequence at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves_only_on_request() {
        let clock = FixedClock::at("2024-01-01T00:00:00Z");
        assert_eq!(clock.now(), clock.now());
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now().to_rfc3339(), "2024-01-01T00:05:00+00:00");
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(), "n-1");
        assert_eq!(ids.next_id(), "n-2");
    }
}

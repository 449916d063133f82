//! Process-wide monotonic timestamps.
//!
//! Every message timestamp is Unix time in milliseconds, bumped forward by
//! one whenever the wall clock has not advanced past the last issued value
//! (several messages in the same millisecond, or the clock stepping
//! backwards). Two calls never return equal or decreasing values, even from
//! different threads.

use std::sync::atomic::{AtomicU64, Ordering};

/// A strictly increasing millisecond counter seeded from the wall clock.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// The next timestamp: `max(now, last + 1)`.
    pub fn next(&self) -> u64 {
        let now = wall_clock_millis();
        // fetch_update retries until no other thread raced us. The closure
        // always returns Some, so the Err arm is unreachable.
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

static CLOCK: MonotonicClock = MonotonicClock::new();

/// The next timestamp from the process-wide clock.
pub fn next_timestamp() -> u64 {
    CLOCK.next()
}

fn wall_clock_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

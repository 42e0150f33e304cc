//! Pinned time source so stored events carry a known `occurred_at`.

use cartflow_core::clock::Clock;
use chrono::{DateTime, TimeZone, Utc};

/// Stamps every appended batch with the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(fixed_now())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The timestamp shared by tests that do not care about time.
///
/// # Panics
///
/// Never in practice: the date is a valid UTC instant.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

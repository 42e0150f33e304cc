//! Time source for event timestamps.

use chrono::{DateTime, Utc};

/// Supplies `occurred_at` when the event store stamps a batch; tests swap in
/// a fixed instant.
pub trait Clock: Send + Sync {
    /// The instant to record on events appended now.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, used by the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

//! Wall-clock deadlines as plain stored values.
//!
//! There are no scheduled jobs anywhere in the engine: a deadline is a
//! timestamp persisted on the quiz, and the expiry checkers compare it to
//! the current time on each poll. Firing logic stays testable because the
//! clock is injected.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Source of "now". Injected into the flow service so tests can steer time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// An absolute deadline stored on the quiz record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Deadline(pub OffsetDateTime);

impl Deadline {
    /// Deadline `window` from now.
    pub fn after(clock: &dyn Clock, window: Duration) -> Self {
        Self(clock.now() + window)
    }

    pub fn has_passed(self, clock: &dyn Clock) -> bool {
        self.0 <= clock.now()
    }
}

/// Hand-cranked clock for deterministic expiry tests.
#[cfg(test)]
pub struct ManualClock {
    now: parking_lot::Mutex<OffsetDateTime>,
}

#[cfg(test)]
impl ManualClock {
    pub fn starting_at(now: OffsetDateTime) -> Self {
        Self {
            now: parking_lot::Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(OffsetDateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

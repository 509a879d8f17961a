//! Test clocks — deterministic `Clock` implementations.

use chrono::{DateTime, TimeZone, Utc};

use tidemark_core::clock::Clock;

/// A clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A fixed clock at an arbitrary but stable test instant.
    ///
    /// # Panics
    ///
    /// Never panics; the embedded date is valid.
    #[must_use]
    pub fn default_instant() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

//! Clock seam for expiry checks and receipt timestamps
//!
//! The core consumes time in two places: comparing an account's expiry date
//! against "today" on the lazy-expiry read path, and stamping transfer
//! receipts at creation. Both go through the [`Clock`] trait so that tests
//! and simulations can pin time deterministically.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant, used to stamp transfer receipts
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date, used for expiry comparison
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant
///
/// Used by tests that need expiry transitions or receipt timestamps to be
/// reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Create a clock that always reports the given instant
    pub fn at(instant: DateTime<Utc>) -> Self {
        FixedClock { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

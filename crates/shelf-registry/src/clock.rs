//! Timestamps and clock sources.
//!
//! The registry never reads the wall clock itself: every mutation takes `now`
//! from its caller. [`Clock`] is how the contract boundary obtains it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch, used as the "no rental" sentinel at the contract boundary.
    pub const ZERO: Self = Self(0);

    /// Create from Unix seconds.
    #[must_use]
    pub const fn from_unix_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Unix seconds.
    #[must_use]
    pub const fn as_unix_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, or `None` if `earlier` is later.
    #[must_use]
    pub const fn checked_since(&self, earlier: Self) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// This timestamp shifted forward.
    #[must_use]
    pub const fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// As a UTC datetime, if representable.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}s", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self::from_unix_secs(secs)
    }
}

/// Source of the current time.
///
/// Readings must be non-decreasing across calls.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = Utc::now().timestamp();
        Timestamp::from_unix_secs(u64::try_from(secs).unwrap_or(0))
    }
}

/// Hand-driven clock for simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(start.as_unix_secs()),
        }
    }

    /// Move to an absolute time. Moving backwards is ignored.
    pub fn set(&self, at: Timestamp) {
        self.secs.fetch_max(at.as_unix_secs(), Ordering::SeqCst);
    }

    /// Advance by a number of seconds.
    pub fn advance_secs(&self, secs: u64) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(secs)));
    }

    /// Advance by whole minutes.
    pub fn advance_minutes(&self, minutes: u64) {
        self.advance_secs(minutes.saturating_mul(60));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_secs(self.secs.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_since() {
        let start = Timestamp::from_unix_secs(1_000);
        assert_eq!(Timestamp::from_unix_secs(1_180).checked_since(start), Some(180));
        assert_eq!(Timestamp::from_unix_secs(999).checked_since(start), None);
    }

    #[test]
    fn test_display_is_rfc3339() {
        assert_eq!(Timestamp::from_unix_secs(0).to_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(Timestamp::from_unix_secs(100));
        clock.advance_minutes(3);
        assert_eq!(clock.now(), Timestamp::from_unix_secs(280));
        clock.advance_secs(5);
        assert_eq!(clock.now(), Timestamp::from_unix_secs(285));
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(Timestamp::from_unix_secs(500));
        clock.set(Timestamp::from_unix_secs(400));
        assert_eq!(clock.now(), Timestamp::from_unix_secs(500));
        clock.set(Timestamp::from_unix_secs(900));
        assert_eq!(clock.now(), Timestamp::from_unix_secs(900));
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.now() > Timestamp::from_unix_secs(1_577_836_800));
    }

    #[test]
    fn test_serialization_is_plain_number() {
        let json = serde_json::to_string(&Timestamp::from_unix_secs(42)).expect("serialize");
        assert_eq!(json, "42");
    }
}

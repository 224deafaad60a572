//! Event-time and processing-time instants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MICROS_PER_DAY: i64 = 24 * 60 * 60 * 1_000_000;

/// An instant in event time, in microseconds since the Unix epoch.
///
/// Event time is the clock carried by the data itself. It only advances
/// through watermarks and never reads the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTime(i64);

impl EventTime {
    /// The smallest representable event time.
    pub const MIN: Self = Self(i64::MIN);

    /// The largest representable event time. A watermark at `MAX` means the
    /// input is complete.
    pub const MAX: Self = Self(i64::MAX);

    /// The maximum timestamp of the global window: one day before `MAX`, so
    /// that timers set at the end of the global window still fire once the
    /// watermark reaches `MAX`.
    pub const END_OF_GLOBAL_WINDOW: Self = Self(i64::MAX - MICROS_PER_DAY);

    /// Creates an event time from microseconds.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Creates an event time from milliseconds, saturating at the bounds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Returns the microseconds since the epoch.
    #[must_use]
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Adds microseconds, saturating at the bounds.
    #[must_use]
    pub const fn saturating_add_micros(self, micros: i64) -> Self {
        Self(self.0.saturating_add(micros))
    }

    /// Subtracts microseconds, saturating at the bounds.
    #[must_use]
    pub const fn saturating_sub_micros(self, micros: i64) -> Self {
        Self(self.0.saturating_sub(micros))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MIN => write!(f, "-inf"),
            Self::MAX => write!(f, "+inf"),
            Self(micros) => write!(f, "{micros}us"),
        }
    }
}

/// An instant on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingTime(DateTime<Utc>);

impl ProcessingTime {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing UTC timestamp.
    #[must_use]
    pub const fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Returns the underlying UTC timestamp.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns this instant shifted by a duration, saturating at the
    /// representable range.
    #[must_use]
    pub fn plus(self, delta: chrono::Duration) -> Self {
        match self.0.checked_add_signed(delta) {
            Some(at) => Self(at),
            None if delta < chrono::Duration::zero() => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl From<DateTime<Utc>> for ProcessingTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl fmt::Display for ProcessingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.6f+00:00"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time_ordering() {
        assert!(EventTime::MIN < EventTime::from_micros(0));
        assert!(EventTime::from_millis(5) < EventTime::END_OF_GLOBAL_WINDOW);
        assert!(EventTime::END_OF_GLOBAL_WINDOW < EventTime::MAX);
    }

    #[test]
    fn test_event_time_saturates() {
        assert_eq!(EventTime::MAX.saturating_add_micros(10), EventTime::MAX);
        assert_eq!(EventTime::MIN.saturating_sub_micros(10), EventTime::MIN);
        assert_eq!(EventTime::from_millis(i64::MAX), EventTime::MAX);
    }

    #[test]
    fn test_event_time_display() {
        assert_eq!(EventTime::MIN.to_string(), "-inf");
        assert_eq!(EventTime::MAX.to_string(), "+inf");
        assert_eq!(EventTime::from_millis(2).to_string(), "2000us");
    }

    #[test]
    fn test_processing_time_plus() {
        let start = ProcessingTime::now();
        let later = start.plus(chrono::Duration::seconds(5));
        assert!(later > start);
    }

    #[test]
    fn test_processing_time_plus_saturates() {
        let latest = ProcessingTime::from(DateTime::<Utc>::MAX_UTC);
        assert_eq!(latest.plus(chrono::Duration::days(1)), latest);

        let earliest = ProcessingTime::from(DateTime::<Utc>::MIN_UTC);
        assert_eq!(earliest.plus(chrono::Duration::days(-1)), earliest);
    }
}

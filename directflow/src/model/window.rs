//! Windows that elements and timers are scoped to.

use super::EventTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A window with a finite maximum timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundedWindow {
    /// The single window covering all of event time.
    Global,
    /// A half-open interval `[start, end)`.
    Interval {
        /// Inclusive start.
        start: EventTime,
        /// Exclusive end.
        end: EventTime,
    },
}

impl BoundedWindow {
    /// Creates an interval window.
    #[must_use]
    pub const fn interval(start: EventTime, end: EventTime) -> Self {
        Self::Interval { start, end }
    }

    /// Returns the largest timestamp that still belongs to the window.
    #[must_use]
    pub const fn max_timestamp(&self) -> EventTime {
        match self {
            Self::Global => EventTime::END_OF_GLOBAL_WINDOW,
            Self::Interval { end, .. } => end.saturating_sub_micros(1),
        }
    }

    /// Returns true if `timestamp` falls inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: EventTime) -> bool {
        match self {
            Self::Global => timestamp <= EventTime::END_OF_GLOBAL_WINDOW,
            Self::Interval { start, end } => *start <= timestamp && timestamp < *end,
        }
    }
}

impl Default for BoundedWindow {
    fn default() -> Self {
        Self::Global
    }
}

impl fmt::Display for BoundedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "GlobalWindow"),
            Self::Interval { start, end } => write!(f, "[{start}, {end})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_max_timestamp() {
        let window = BoundedWindow::interval(EventTime::from_millis(0), EventTime::from_millis(10));
        assert_eq!(window.max_timestamp(), EventTime::from_micros(9_999));
    }

    #[test]
    fn test_interval_contains_is_half_open() {
        let window = BoundedWindow::interval(EventTime::from_millis(0), EventTime::from_millis(10));
        assert!(window.contains(EventTime::from_millis(0)));
        assert!(!window.contains(EventTime::from_millis(10)));
    }

    #[test]
    fn test_global_window() {
        assert_eq!(BoundedWindow::default(), BoundedWindow::Global);
        assert_eq!(
            BoundedWindow::Global.max_timestamp(),
            EventTime::END_OF_GLOBAL_WINDOW
        );
        assert!(!BoundedWindow::Global.contains(EventTime::MAX));
    }

    #[test]
    fn test_window_serialization() {
        let json = serde_json::to_string(&BoundedWindow::Global).unwrap();
        assert_eq!(json, r#"{"kind":"global"}"#);
    }
}

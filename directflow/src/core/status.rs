//! Lifecycle states of timers and buffered elements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a timer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Set and waiting for its clock.
    Scheduled,
    /// Deadline reached; wrapped in a work item and queued for its key.
    Fired,
    /// Consumed by the evaluator.
    Delivered,
    /// Deleted or replaced before delivery.
    Cancelled,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::Scheduled
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Fired => write!(f, "fired"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Where a run of buffered elements is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementsState {
    /// Accumulating in the element buffer.
    Buffered,
    /// Consumed by the evaluator.
    Delivered,
}

impl Default for ElementsState {
    fn default() -> Self {
        Self::Buffered
    }
}

impl fmt::Display for ElementsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered => write!(f, "buffered"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_state_display() {
        assert_eq!(TimerState::Scheduled.to_string(), "scheduled");
        assert_eq!(TimerState::Fired.to_string(), "fired");
        assert_eq!(TimerState::Delivered.to_string(), "delivered");
        assert_eq!(TimerState::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&TimerState::Fired).unwrap();
        assert_eq!(json, r#""fired""#);
        let json = serde_json::to_string(&ElementsState::Buffered).unwrap();
        assert_eq!(json, r#""buffered""#);
    }
}

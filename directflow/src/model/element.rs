//! Grouping keys and windowed element values.

use super::{BoundedWindow, EventTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A grouping key. Keyed transforms partition their state and timers by key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Creates a new key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An element together with its event timestamp and windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedValue {
    /// The element payload.
    pub value: serde_json::Value,
    /// The element's event timestamp.
    pub timestamp: EventTime,
    /// The windows the element belongs to.
    pub windows: Vec<BoundedWindow>,
}

impl WindowedValue {
    /// Creates a windowed value.
    #[must_use]
    pub fn new(value: serde_json::Value, timestamp: EventTime, windows: Vec<BoundedWindow>) -> Self {
        Self {
            value,
            timestamp,
            windows,
        }
    }

    /// Creates a value in the global window at the minimum timestamp.
    #[must_use]
    pub fn in_global_window(value: serde_json::Value) -> Self {
        Self::new(value, EventTime::MIN, vec![BoundedWindow::Global])
    }

    /// Returns a copy of this element carrying a different payload.
    #[must_use]
    pub fn with_value(&self, value: serde_json::Value) -> Self {
        Self {
            value,
            timestamp: self.timestamp,
            windows: self.windows.clone(),
        }
    }

    /// Splits a key-value element, encoded as a two-item array
    /// `[key, value]`, into its key and a copy carrying only the value.
    ///
    /// Only string keys are accepted, so `[7, v]` and `["7", v]` can never
    /// collapse onto the same key.
    #[must_use]
    pub fn split_kv(&self) -> Option<(Key, WindowedValue)> {
        let [serde_json::Value::String(key), value] = self.value.as_array()?.as_slice() else {
            return None;
        };
        Some((Key::new(key.clone()), self.with_value(value.clone())))
    }
}

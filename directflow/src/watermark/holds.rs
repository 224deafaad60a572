//! Per-key watermark holds of one transform.

use crate::core::WatermarkHold;
use crate::model::{EventTime, Key};
use std::collections::HashMap;

/// A change in a transform's minimum hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldChange {
    /// Minimum hold before the update.
    pub previous: Option<EventTime>,
    /// Minimum hold after the update.
    pub current: Option<EventTime>,
}

/// The latest hold requested by each key of a transform.
///
/// A key's hold is replaced by every result evaluated for that key;
/// `WatermarkHold::None` releases it.
#[derive(Debug, Default)]
pub struct KeyedHolds {
    holds: HashMap<Key, EventTime>,
}

impl KeyedHolds {
    /// Creates an empty set of holds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the hold of `key`. Returns the change in the minimum hold,
    /// or `None` if the minimum did not move.
    pub fn update(&mut self, key: &Key, hold: WatermarkHold) -> Option<HoldChange> {
        let previous = self.min_hold();
        match hold {
            WatermarkHold::At(at) => {
                self.holds.insert(key.clone(), at);
            }
            WatermarkHold::None => {
                self.holds.remove(key);
            }
        }
        let current = self.min_hold();
        (previous != current).then_some(HoldChange { previous, current })
    }

    /// Returns the hold of a key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<EventTime> {
        self.holds.get(key).copied()
    }

    /// Returns the earliest hold over all keys.
    #[must_use]
    pub fn min_hold(&self) -> Option<EventTime> {
        self.holds.values().min().copied()
    }

    /// Returns the number of keys holding the watermark.
    #[must_use]
    pub fn len(&self) -> usize {
        self.holds.len()
    }

    /// Returns true if no key holds the watermark.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }
}

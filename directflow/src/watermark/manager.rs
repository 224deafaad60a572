//! The watermark manager seam and an in-memory implementation.

use crate::model::{EventTime, TransformId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Aggregates holds and input progress into per-transform watermarks.
#[cfg_attr(test, mockall::automock)]
pub trait WatermarkManager: Send + Sync {
    /// Replaces the minimum hold of a transform. `None` releases it.
    fn update_hold(&self, transform: &TransformId, hold: Option<EventTime>);

    /// Advances the input watermark of a transform. Watermarks never move
    /// backwards; the effective input watermark is returned.
    fn advance_input_watermark(&self, transform: &TransformId, watermark: EventTime) -> EventTime;

    /// Returns the input watermark of a transform.
    fn input_watermark(&self, transform: &TransformId) -> EventTime;

    /// Returns the output watermark of a transform.
    fn output_watermark(&self, transform: &TransformId) -> EventTime;
}

#[derive(Debug, Clone, Copy)]
struct TransformWatermarks {
    input: EventTime,
    hold: Option<EventTime>,
    output: EventTime,
}

impl Default for TransformWatermarks {
    fn default() -> Self {
        Self {
            input: EventTime::MIN,
            hold: None,
            output: EventTime::MIN,
        }
    }
}

impl TransformWatermarks {
    fn refresh_output(&mut self) {
        let candidate = self.hold.map_or(self.input, |hold| hold.min(self.input));
        self.output = self.output.max(candidate);
    }
}

/// Keeps watermarks of every transform in memory.
///
/// The output watermark is the minimum of the input watermark and the hold,
/// and never regresses.
#[derive(Debug, Default)]
pub struct InMemoryWatermarkManager {
    transforms: RwLock<HashMap<TransformId, TransformWatermarks>>,
}

impl InMemoryWatermarkManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current hold of a transform.
    #[must_use]
    pub fn hold(&self, transform: &TransformId) -> Option<EventTime> {
        self.transforms.read().get(transform).and_then(|w| w.hold)
    }
}

impl WatermarkManager for InMemoryWatermarkManager {
    fn update_hold(&self, transform: &TransformId, hold: Option<EventTime>) {
        let mut transforms = self.transforms.write();
        let watermarks = transforms.entry(transform.clone()).or_default();
        watermarks.hold = hold;
        watermarks.refresh_output();
        debug!(
            transform = %transform,
            hold = ?hold,
            output = %watermarks.output,
            "Watermark hold updated"
        );
    }

    fn advance_input_watermark(&self, transform: &TransformId, watermark: EventTime) -> EventTime {
        let mut transforms = self.transforms.write();
        let watermarks = transforms.entry(transform.clone()).or_default();
        watermarks.input = watermarks.input.max(watermark);
        watermarks.refresh_output();
        watermarks.input
    }

    fn input_watermark(&self, transform: &TransformId) -> EventTime {
        self.transforms
            .read()
            .get(transform)
            .map_or(EventTime::MIN, |w| w.input)
    }

    fn output_watermark(&self, transform: &TransformId) -> EventTime {
        self.transforms
            .read()
            .get(transform)
            .map_or(EventTime::MIN, |w| w.output)
    }
}

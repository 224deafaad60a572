//! The outcome of evaluating one bundle against one transform.

use super::TimerUpdate;
use crate::errors::MetricsAlreadyAttachedError;
use crate::metrics::{CounterDeltas, MetricUpdates};
use crate::model::{AppliedTransform, EventTime, TransformId, UncommittedBundle, WindowedValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A watermark hold requested by an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum WatermarkHold {
    /// No hold: the transform does not keep the watermark back.
    #[default]
    None,
    /// Keep the output watermark at or below this event time until the
    /// result's outputs are committed.
    At(EventTime),
}

impl WatermarkHold {
    /// Returns the held event time, if any.
    #[must_use]
    pub const fn as_event_time(&self) -> Option<EventTime> {
        match self {
            Self::None => None,
            Self::At(at) => Some(*at),
        }
    }

    /// Returns true if a hold is requested.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl From<Option<EventTime>> for WatermarkHold {
    fn from(hold: Option<EventTime>) -> Self {
        hold.map_or(Self::None, Self::At)
    }
}

/// A write-once slot for the logical metric updates of a result.
///
/// Empty at construction; filled by the executor after the evaluator returns.
#[derive(Debug, Default)]
pub struct LogicalMetricsSlot {
    updates: OnceLock<MetricUpdates>,
}

impl LogicalMetricsSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the slot. Returns the rejected updates if it was already filled.
    pub fn fill(&self, updates: MetricUpdates) -> Result<(), MetricUpdates> {
        self.updates.set(updates)
    }

    /// Returns the attached updates, if any.
    #[must_use]
    pub fn get(&self) -> Option<&MetricUpdates> {
        self.updates.get()
    }

    /// Returns true once the slot has been filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.updates.get().is_some()
    }
}

/// The result of evaluating one bundle with a transform evaluator.
///
/// Constructor-supplied fields are read-only. Only the logical metrics slot
/// changes after construction, and only once.
#[derive(Debug)]
pub struct TransformResult {
    transform: Arc<AppliedTransform>,
    uncommitted_output_bundles: Vec<UncommittedBundle>,
    unprocessed_bundle: Option<UncommittedBundle>,
    counters: CounterDeltas,
    watermark_hold: WatermarkHold,
    undeclared_tag_values: Option<HashMap<String, Vec<WindowedValue>>>,
    timer_update: TimerUpdate,
    logical_metric_updates: LogicalMetricsSlot,
}

impl TransformResult {
    /// Creates a result. Every field is supplied explicitly; pass empty
    /// collections, `None` and `WatermarkHold::None` for a no-op evaluation.
    #[must_use]
    pub fn new(
        transform: Arc<AppliedTransform>,
        uncommitted_output_bundles: Vec<UncommittedBundle>,
        unprocessed_bundle: Option<UncommittedBundle>,
        counters: CounterDeltas,
        watermark_hold: WatermarkHold,
    ) -> Self {
        Self {
            transform,
            uncommitted_output_bundles,
            unprocessed_bundle,
            counters,
            watermark_hold,
            undeclared_tag_values: None,
            timer_update: TimerUpdate::new(),
            logical_metric_updates: LogicalMetricsSlot::new(),
        }
    }

    /// Creates a result that produced nothing and holds nothing.
    #[must_use]
    pub fn empty(transform: Arc<AppliedTransform>) -> Self {
        Self::new(
            transform,
            Vec::new(),
            None,
            CounterDeltas::new(),
            WatermarkHold::None,
        )
    }

    /// Attaches materialized side-output values. Only used when the engine
    /// is configured to materialize every intermediate value.
    #[must_use]
    pub fn with_undeclared_tag_values(mut self, values: HashMap<String, Vec<WindowedValue>>) -> Self {
        self.undeclared_tag_values = Some(values);
        self
    }

    /// Attaches the timer changes requested by the evaluation.
    #[must_use]
    pub fn with_timer_update(mut self, update: TimerUpdate) -> Self {
        self.timer_update = update;
        self
    }

    /// Returns the transform this result belongs to.
    #[must_use]
    pub fn transform(&self) -> &Arc<AppliedTransform> {
        &self.transform
    }

    /// Returns the transform id.
    #[must_use]
    pub fn transform_id(&self) -> &TransformId {
        &self.transform.id
    }

    /// Returns the output bundles awaiting commitment.
    #[must_use]
    pub fn uncommitted_output_bundles(&self) -> &[UncommittedBundle] {
        &self.uncommitted_output_bundles
    }

    /// Returns leftover input, if the evaluator did not consume it all.
    #[must_use]
    pub fn unprocessed_bundle(&self) -> Option<&UncommittedBundle> {
        self.unprocessed_bundle.as_ref()
    }

    /// Returns the counter deltas.
    #[must_use]
    pub fn counters(&self) -> &CounterDeltas {
        &self.counters
    }

    /// Returns the requested watermark hold.
    #[must_use]
    pub fn watermark_hold(&self) -> WatermarkHold {
        self.watermark_hold
    }

    /// Returns the materialized side-output values, if any.
    #[must_use]
    pub fn undeclared_tag_values(&self) -> Option<&HashMap<String, Vec<WindowedValue>>> {
        self.undeclared_tag_values.as_ref()
    }

    /// Returns the requested timer changes.
    #[must_use]
    pub fn timer_update(&self) -> &TimerUpdate {
        &self.timer_update
    }

    /// Returns the logical metric updates, once attached.
    #[must_use]
    pub fn logical_metric_updates(&self) -> Option<&MetricUpdates> {
        self.logical_metric_updates.get()
    }

    /// Attaches the logical metric updates.
    ///
    /// # Errors
    ///
    /// Returns `MetricsAlreadyAttachedError` if updates were already attached.
    pub fn attach_logical_metrics(&self, updates: MetricUpdates) -> Result<(), MetricsAlreadyAttachedError> {
        self.logical_metric_updates
            .fill(updates)
            .map_err(|_| MetricsAlreadyAttachedError::new(self.transform.id.clone()))
    }

    /// Returns true if committing this result changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.uncommitted_output_bundles.is_empty()
            && self.unprocessed_bundle.is_none()
            && self.counters.is_empty()
            && !self.watermark_hold.is_held()
            && self.timer_update.is_empty()
    }

    /// Splits the result for commitment.
    #[must_use]
    pub fn into_parts(self) -> TransformResultParts {
        TransformResultParts {
            transform: self.transform,
            uncommitted_output_bundles: self.uncommitted_output_bundles,
            unprocessed_bundle: self.unprocessed_bundle,
            counters: self.counters,
            watermark_hold: self.watermark_hold,
            undeclared_tag_values: self.undeclared_tag_values,
            timer_update: self.timer_update,
            logical_metric_updates: self.logical_metric_updates.updates.into_inner(),
        }
    }
}

/// The owned pieces of a [`TransformResult`], handed to commitment.
#[derive(Debug)]
pub struct TransformResultParts {
    /// The transform the result belongs to.
    pub transform: Arc<AppliedTransform>,
    /// Output bundles awaiting commitment.
    pub uncommitted_output_bundles: Vec<UncommittedBundle>,
    /// Leftover input for the same transform.
    pub unprocessed_bundle: Option<UncommittedBundle>,
    /// Counter deltas.
    pub counters: CounterDeltas,
    /// Requested hold.
    pub watermark_hold: WatermarkHold,
    /// Materialized side-output values.
    pub undeclared_tag_values: Option<HashMap<String, Vec<WindowedValue>>>,
    /// Requested timer changes.
    pub timer_update: TimerUpdate,
    /// Logical metric updates, if attached.
    pub logical_metric_updates: Option<MetricUpdates>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WindowedValue;

    fn transform() -> Arc<AppliedTransform> {
        AppliedTransform::new("ParDo(Count)").with_output("pc/out").shared()
    }

    #[test]
    fn test_empty_result_is_noop() {
        let result = TransformResult::empty(transform());
        assert!(result.is_noop());
        assert!(result.uncommitted_output_bundles().is_empty());
        assert!(result.unprocessed_bundle().is_none());
        assert_eq!(result.watermark_hold(), WatermarkHold::None);
        assert!(result.undeclared_tag_values().is_none());
        assert!(result.logical_metric_updates().is_none());
    }

    #[test]
    fn test_result_with_outputs_is_not_noop() {
        let bundle = UncommittedBundle::new("pc/out")
            .with_element(WindowedValue::in_global_window(serde_json::json!(1)));
        let result = TransformResult::new(
            transform(),
            vec![bundle],
            None,
            CounterDeltas::new(),
            WatermarkHold::None,
        );
        assert!(!result.is_noop());
        assert_eq!(result.uncommitted_output_bundles().len(), 1);
    }

    #[test]
    fn test_hold_alone_is_not_noop() {
        let result = TransformResult::new(
            transform(),
            Vec::new(),
            None,
            CounterDeltas::new(),
            WatermarkHold::At(EventTime::from_millis(5)),
        );
        assert!(!result.is_noop());
    }

    #[test]
    fn test_metrics_attach_once() {
        let result = TransformResult::empty(transform());
        let updates = MetricUpdates::from_counters(CounterDeltas::new().with("n", 1));

        result.attach_logical_metrics(updates.clone()).unwrap();
        assert_eq!(result.logical_metric_updates(), Some(&updates));
    }

    #[test]
    fn test_metrics_second_attach_rejected() {
        let result = TransformResult::empty(transform());
        result.attach_logical_metrics(MetricUpdates::new()).unwrap();

        let err = result
            .attach_logical_metrics(MetricUpdates::from_counters(CounterDeltas::new().with("n", 9)))
            .unwrap_err();

        assert_eq!(err.transform, TransformId::from("ParDo(Count)"));
        assert_eq!(result.logical_metric_updates(), Some(&MetricUpdates::new()));
    }

    #[test]
    fn test_into_parts_carries_attached_metrics() {
        let result = TransformResult::empty(transform());
        result
            .attach_logical_metrics(MetricUpdates::from_counters(CounterDeltas::new().with("n", 2)))
            .unwrap();

        let parts = result.into_parts();
        assert_eq!(parts.logical_metric_updates.unwrap().counters.get("n"), Some(2));
        assert_eq!(parts.transform.id, TransformId::from("ParDo(Count)"));
    }

    #[test]
    fn test_watermark_hold_from_option() {
        assert_eq!(WatermarkHold::from(None), WatermarkHold::None);
        let at = EventTime::from_millis(1);
        assert_eq!(WatermarkHold::from(Some(at)).as_event_time(), Some(at));
    }
}

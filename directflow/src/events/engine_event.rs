//! Engine lifecycle events.

use crate::core::{ElementsState, ScheduledTimer, TimerFiring, TimerId, TimerState};
use crate::model::{CommittedBundle, EventTime, Key, TransformId};
use serde::{Deserialize, Serialize};

/// An event emitted by the engine while scheduling and committing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// The event type (e.g., "bundle.committed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl EngineEvent {
    /// Creates a new event without data.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
                .to_string(),
            data: serde_json::Map::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the payload as a JSON value, for event sinks.
    #[must_use]
    pub fn data_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.data.clone())
    }

    /// Creates a "bundle.committed" event.
    #[must_use]
    pub fn bundle_committed(transform: &TransformId, bundle: &CommittedBundle) -> Self {
        Self::new("bundle.committed")
            .add_data("transform", serde_json::json!(transform))
            .add_data("bundle_id", serde_json::json!(bundle.id.to_string()))
            .add_data("pcollection", serde_json::json!(bundle.pcollection))
            .add_data("elements", serde_json::json!(bundle.len()))
    }

    /// Creates an "elements.buffered" event. Routed bundles without a key
    /// leave `key` null.
    #[must_use]
    pub fn elements_buffered(transform: &TransformId, key: Option<&Key>, elements: usize) -> Self {
        Self::new("elements.buffered")
            .add_data("transform", serde_json::json!(transform))
            .add_data("key", serde_json::json!(key))
            .add_data("elements", serde_json::json!(elements))
            .add_data("state", serde_json::json!(ElementsState::Buffered))
    }

    /// Creates a "timer.set" event.
    #[must_use]
    pub fn timer_set(transform: &TransformId, timer: &ScheduledTimer) -> Self {
        Self::new("timer.set")
            .add_data("transform", serde_json::json!(transform))
            .add_data("timer", serde_json::json!(timer.id().to_string()))
            .add_data("timestamp", serde_json::json!(timer.timestamp().to_string()))
            .add_data("state", serde_json::json!(TimerState::Scheduled))
    }

    /// Creates a "timer.fired" event.
    #[must_use]
    pub fn timer_fired(transform: &TransformId, firing: &TimerFiring) -> Self {
        Self::new("timer.fired")
            .add_data("transform", serde_json::json!(transform))
            .add_data("timer", serde_json::json!(firing.id().to_string()))
            .add_data("timestamp", serde_json::json!(firing.timestamp().to_string()))
            .add_data("state", serde_json::json!(TimerState::Fired))
    }

    /// Creates a "timer.superseded" event for a fired but undelivered timer
    /// that was reset or deleted.
    #[must_use]
    pub fn timer_superseded(transform: &TransformId, id: &TimerId) -> Self {
        Self::new("timer.superseded")
            .add_data("transform", serde_json::json!(transform))
            .add_data("timer", serde_json::json!(id.to_string()))
            .add_data("state", serde_json::json!(TimerState::Cancelled))
    }

    /// Creates a "watermark.hold_updated" event.
    #[must_use]
    pub fn hold_updated(transform: &TransformId, hold: Option<EventTime>) -> Self {
        Self::new("watermark.hold_updated")
            .add_data("transform", serde_json::json!(transform))
            .add_data("hold", serde_json::json!(hold.map(EventTime::as_micros)))
    }

    /// Creates a "work_item.delivered" event.
    #[must_use]
    pub fn work_item_delivered(transform: &TransformId, key: &Key, timer: bool, duration_ms: f64) -> Self {
        Self::new("work_item.delivered")
            .add_data("transform", serde_json::json!(transform))
            .add_data("key", serde_json::json!(key))
            .add_data("kind", serde_json::json!(if timer { "timer" } else { "elements" }))
            .add_data(
                "state",
                if timer {
                    serde_json::json!(TimerState::Delivered)
                } else {
                    serde_json::json!(ElementsState::Delivered)
                },
            )
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleFactory, ProcessingTime, UncommittedBundle, WindowedValue};

    #[test]
    fn test_event_creation() {
        let event = EngineEvent::new("test.event").add_data("x", serde_json::json!(1));
        assert_eq!(event.event_type, "test.event");
        assert_eq!(event.data.len(), 1);
        assert_eq!(event.data_value()["x"], 1);
    }

    #[test]
    fn test_bundle_committed_event() {
        let bundle = BundleFactory::new().commit(
            UncommittedBundle::new("pc/out")
                .with_element(WindowedValue::in_global_window(serde_json::json!(1))),
            ProcessingTime::now(),
        );
        let event = EngineEvent::bundle_committed(&TransformId::from("A"), &bundle);

        assert_eq!(event.event_type, "bundle.committed");
        assert_eq!(event.data["elements"], 1);
        assert_eq!(event.data["pcollection"], "pc/out");
    }

    #[test]
    fn test_hold_updated_event() {
        let event = EngineEvent::hold_updated(&TransformId::from("A"), None);
        assert_eq!(event.data["hold"], serde_json::Value::Null);

        let event = EngineEvent::hold_updated(&TransformId::from("A"), Some(EventTime::from_micros(7)));
        assert_eq!(event.data["hold"], 7);
    }

    #[test]
    fn test_timer_events_carry_state() {
        let id = crate::core::TimerId::new(
            Key::from("k"),
            crate::model::BoundedWindow::Global,
            "flush",
            crate::core::TimeDomain::EventTime,
        );
        let event = EngineEvent::timer_superseded(&TransformId::from("A"), &id);
        assert_eq!(event.data["state"], "cancelled");

        let event = EngineEvent::work_item_delivered(&TransformId::from("A"), &Key::from("k"), false, 1.0);
        assert_eq!(event.data["state"], "delivered");
        assert_eq!(event.data["kind"], "elements");
    }

    #[test]
    fn test_scheduling_events_carry_state() {
        let timer = ScheduledTimer::event_time(
            Key::from("k"),
            crate::model::BoundedWindow::Global,
            "flush",
            EventTime::from_millis(10),
        );
        let event = EngineEvent::timer_set(&TransformId::from("A"), &timer);
        assert_eq!(event.event_type, "timer.set");
        assert_eq!(event.data["state"], "scheduled");

        let event = EngineEvent::elements_buffered(&TransformId::from("A"), Some(&Key::from("k")), 3);
        assert_eq!(event.data["state"], "buffered");
        assert_eq!(event.data["key"], "k");
        assert_eq!(event.data["elements"], 3);

        let unkeyed = EngineEvent::elements_buffered(&TransformId::from("A"), None, 1);
        assert!(unkeyed.data["key"].is_null());
    }

    #[test]
    fn test_event_serialization() {
        let event = EngineEvent::new("timer.fired");
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.event_type, "timer.fired");
    }
}

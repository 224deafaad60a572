//! Test fixtures for engine testing.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::ScheduledTimer;
use crate::errors::EngineResult;
use crate::events::CollectingEventSink;
use crate::model::{AppliedTransform, BoundedWindow, EventTime, Key, ProcessingTime, WindowedValue};
use crate::runtime::{EvaluationEngine, EvaluatorFactory};
use crate::watermark::InMemoryWatermarkManager;

/// Creates a shared applied transform.
#[must_use]
pub fn transform(id: &str, inputs: &[&str], outputs: &[&str]) -> Arc<AppliedTransform> {
    let mut transform = AppliedTransform::new(id);
    for input in inputs {
        transform = transform.with_input(*input);
    }
    for output in outputs {
        transform = transform.with_output(*output);
    }
    transform.shared()
}

/// Creates an element in the global window.
#[must_use]
pub fn value(value: serde_json::Value) -> WindowedValue {
    WindowedValue::in_global_window(value)
}

/// Creates an element in the global window at an event time in milliseconds.
#[must_use]
pub fn value_at(value: serde_json::Value, millis: i64) -> WindowedValue {
    WindowedValue::new(value, EventTime::from_millis(millis), vec![BoundedWindow::Global])
}

/// Creates a `[key, value]` element for routing through unkeyed bundles.
#[must_use]
pub fn kv(key: &str, value: serde_json::Value) -> WindowedValue {
    WindowedValue::in_global_window(serde_json::json!([key, value]))
}

/// Creates an event-time timer in the global window.
#[must_use]
pub fn event_timer(key: &str, name: &str, millis: i64) -> ScheduledTimer {
    ScheduledTimer::event_time(
        Key::from(key),
        BoundedWindow::Global,
        name,
        EventTime::from_millis(millis),
    )
}

/// Creates a processing-time timer in the global window.
#[must_use]
pub fn processing_timer(key: &str, name: &str, at: ProcessingTime) -> ScheduledTimer {
    ScheduledTimer::processing_time(Key::from(key), BoundedWindow::Global, name, at)
}

/// An engine wired to an in-memory watermark manager and a collecting event
/// sink.
#[derive(Debug)]
pub struct EngineFixture {
    /// The engine under test.
    pub engine: EvaluationEngine,
    /// The watermark manager the engine reports to.
    pub watermarks: Arc<InMemoryWatermarkManager>,
    /// Every event the engine emitted.
    pub events: Arc<CollectingEventSink>,
}

impl EngineFixture {
    /// Creates a fixture with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let watermarks = Arc::new(InMemoryWatermarkManager::new());
        let events = Arc::new(CollectingEventSink::new());
        let engine = EvaluationEngine::new(config)?
            .with_watermark_manager(watermarks.clone())
            .with_event_sink(events.clone());
        Ok(Self {
            engine,
            watermarks,
            events,
        })
    }

    /// Registers a transform, returning the fixture for chaining.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform is already registered.
    pub fn with_transform(
        self,
        transform: Arc<AppliedTransform>,
        factory: Arc<dyn EvaluatorFactory>,
    ) -> EngineResult<Self> {
        self.engine.register_transform(transform, factory)?;
        Ok(self)
    }
}

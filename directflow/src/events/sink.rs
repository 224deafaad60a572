//! Destinations for engine events.

use super::EngineEvent;
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Receives engine events.
///
/// The engine publishes from inside a key's critical section: sinks must not
/// block and must never fail.
pub trait EventSink: Send + Sync {
    /// Hands an event over without waiting.
    fn publish(&self, event: EngineEvent);
}

/// Drops every event. The engine default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn publish(&self, _event: EngineEvent) {}
}

/// Writes events to `tracing`, one line per event.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Logs at `level`; anything other than `DEBUG` logs at `INFO`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn publish(&self, event: EngineEvent) {
        let transform = event.data.get("transform").and_then(|v| v.as_str()).unwrap_or("-");
        let data = event.data_value();
        if self.level == Level::DEBUG {
            debug!(event = %event.event_type, transform, data = %data, "Engine event");
        } else {
            info!(event = %event.event_type, transform, data = %data, "Engine event");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<EngineEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.read().clone()
    }

    /// Number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Forgets every collected event.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Events whose type starts with `prefix`, e.g. `"timer."`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<EngineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn publish(&self, event: EngineEvent) {
        self.events.write().push(event);
    }
}

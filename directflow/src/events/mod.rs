//! Engine event emission for observability.

mod engine_event;
mod sink;

pub use engine_event::EngineEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

//! Logging and span helpers.

mod tracing;

pub use self::tracing::{init_tracing, EvaluationTimer, TracingConfig, WorkItemSpanAttributes};

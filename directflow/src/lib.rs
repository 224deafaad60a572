//! # Directflow
//!
//! A local execution engine for keyed dataflow pipelines.
//!
//! Directflow schedules work per `(transform, key)` and commits what each
//! evaluation reports:
//!
//! - **Transform results**: output bundles, unprocessed elements, counters,
//!   a watermark hold and timer changes, with write-once logical metrics
//! - **Keyed work items**: either one fired timer or a run of elements,
//!   never both and never neither
//! - **Timers**: event-time and processing-time timers per key and window,
//!   fired once the watermark or the clock passes them
//! - **Watermark holds**: per-key holds aggregated into a transform's output
//!   watermark
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use directflow::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = EvaluationEngine::new(EngineConfig::default())?;
//! let counts = AppliedTransform::new("ParDo(Count)").with_input("clicks").shared();
//! engine.register_transform(counts, Arc::new(CountEvaluatorFactory))?;
//!
//! engine.submit_elements(&TransformId::from("ParDo(Count)"), Key::from("user-1"), values).await?;
//! engine.advance_input_watermark(&TransformId::from("ParDo(Count)"), EventTime::MAX).await?;
//! let summary = engine.run_until_idle().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod model;
pub mod observability;
pub mod runtime;
pub mod testing;
pub mod timers;
pub mod watermark;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{
        KeyedWorkItem, ScheduledTimer, TimeDomain, TimerFiring, TimerId, TimerTimestamp,
        TimerUpdate, TransformResult, WatermarkHold, WorkPayload,
    };
    pub use crate::errors::{
        EngineError, EngineResult, MetricsAlreadyAttachedError, TimeDomainMismatchError,
        WorkItemError, WorkItemViolation,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::metrics::{CounterDeltas, MetricUpdates};
    pub use crate::model::{
        AppliedTransform, BoundedWindow, BundleFactory, CommittedBundle, EventTime, Key,
        ProcessingTime, TransformId, UncommittedBundle, WindowedValue,
    };
    pub use crate::observability::{init_tracing, TracingConfig};
    pub use crate::runtime::{
        CommittedResult, EvaluationContext, EvaluationEngine, EvaluatorFactory, RunSummary,
        TransformEvaluator,
    };
    pub use crate::watermark::{InMemoryWatermarkManager, WatermarkManager};
}

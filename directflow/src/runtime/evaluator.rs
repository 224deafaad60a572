//! Evaluator traits implemented by transforms.
//!
//! Evaluators are external to the engine: they turn one keyed work item into
//! a [`TransformResult`]. The engine only depends on these traits.

use crate::core::{TimerFiring, TransformResult};
use crate::errors::EngineResult;
use crate::model::{AppliedTransform, EventTime, Key, ProcessingTime, WindowedValue};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// What an evaluator can observe about the engine when it is created.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// The transform being evaluated.
    pub transform: Arc<AppliedTransform>,
    /// The key of the work item.
    pub key: Key,
    /// The transform's input watermark.
    pub input_watermark: EventTime,
    /// The engine's processing time.
    pub processing_time: ProcessingTime,
    /// Whether undeclared side-output values should be reported.
    pub materialize_all_values: bool,
}

/// Evaluates one work item for one key.
///
/// The engine calls exactly one of [`process_elements`](Self::process_elements)
/// or [`on_timer`](Self::on_timer), then [`finish_bundle`](Self::finish_bundle).
#[async_trait]
pub trait TransformEvaluator: Send {
    /// Processes buffered elements for the key, in order.
    async fn process_elements(&mut self, key: &Key, elements: Vec<WindowedValue>) -> EngineResult<()>;

    /// Runs the callback of a fired timer.
    async fn on_timer(&mut self, firing: TimerFiring) -> EngineResult<()>;

    /// Finishes the bundle and reports its result.
    async fn finish_bundle(self: Box<Self>) -> EngineResult<TransformResult>;
}

/// Creates evaluators for one transform.
pub trait EvaluatorFactory: Send + Sync + Debug {
    /// Creates an evaluator for one work item.
    fn create_evaluator(&self, ctx: &EvaluationContext) -> EngineResult<Box<dyn TransformEvaluator>>;
}

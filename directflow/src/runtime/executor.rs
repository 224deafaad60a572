//! Runs one keyed work item through an evaluator.

use super::evaluator::TransformEvaluator;
use crate::core::{KeyedWorkItem, TransformResult, WorkPayload};
use crate::errors::{EngineError, EngineResult};
use crate::metrics::MetricUpdates;
use crate::model::{AppliedTransform, Key};
use crate::observability::{EvaluationTimer, WorkItemSpanAttributes};
use std::sync::Arc;
use tracing::{debug, error, Instrument};

/// Distribution recording the number of elements per delivered work item.
pub const ELEMENTS_PER_WORK_ITEM: &str = "directflow.work_item.elements";

/// A work item that was evaluated successfully.
#[derive(Debug)]
pub struct ExecutedWorkItem {
    /// The key the item was delivered for.
    pub key: Key,
    /// Whether the item carried a timer firing.
    pub was_timer: bool,
    /// Number of elements delivered.
    pub elements: usize,
    /// The evaluator's result, with logical metrics attached.
    pub result: TransformResult,
    /// Evaluation time in milliseconds.
    pub duration_ms: f64,
}

/// Delivers work items to evaluators and finalizes their results.
///
/// The executor is the only component that attaches logical metric updates
/// to a [`TransformResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformExecutor;

impl TransformExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluates a work item.
    ///
    /// # Errors
    ///
    /// Returns the evaluator's error unchanged, `EngineError::Internal` if
    /// the result belongs to another transform, and
    /// `EngineError::DoubleMetricsAttachment` if the result already carried
    /// logical metrics.
    pub async fn execute(
        &self,
        transform: &Arc<AppliedTransform>,
        item: KeyedWorkItem,
        mut evaluator: Box<dyn TransformEvaluator>,
    ) -> EngineResult<ExecutedWorkItem> {
        let (key, payload) = item.into_parts();
        let timer = EvaluationTimer::start(transform.id.as_str(), key.as_str());
        let (was_timer, elements) = match &payload {
            WorkPayload::Timer(_) => (true, 0),
            WorkPayload::Elements(values) => (false, values.len()),
        };
        let attrs = WorkItemSpanAttributes::new(transform.id.as_str(), key.as_str())
            .with_kind(if was_timer { "timer" } else { "elements" })
            .with_elements(elements);

        let outcome = match payload {
            WorkPayload::Timer(firing) => {
                debug!(transform = %transform.id, key = %key, timer = %firing.id(), "Delivering timer");
                evaluator.on_timer(firing).instrument(timer.span().clone()).await
            }
            WorkPayload::Elements(values) => {
                debug!(transform = %transform.id, key = %key, elements, "Delivering elements");
                evaluator
                    .process_elements(&key, values)
                    .instrument(timer.span().clone())
                    .await
            }
        };
        let result = match outcome {
            Ok(()) => evaluator.finish_bundle().instrument(timer.span().clone()).await,
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                let attrs = attrs
                    .with_duration_ms(timer.elapsed_ms())
                    .with_error(e.to_string());
                error!(attributes = ?attrs.to_otel_attributes(), "Work item evaluation failed");
                return Err(e);
            }
        };

        if result.transform_id() != &transform.id {
            return Err(EngineError::Internal(format!(
                "evaluator for '{}' returned a result for '{}'",
                transform.id,
                result.transform_id()
            )));
        }

        let mut updates = MetricUpdates::from_counters(result.counters().clone());
        if !was_timer {
            updates.observe(ELEMENTS_PER_WORK_ITEM, i64::try_from(elements).unwrap_or(i64::MAX));
        }
        result.attach_logical_metrics(updates)?;

        let duration_ms = timer.finish();
        let attrs = attrs.with_duration_ms(duration_ms);
        debug!(attributes = ?attrs.to_otel_attributes(), "Work item evaluated");

        Ok(ExecutedWorkItem {
            key,
            was_timer,
            elements,
            result,
            duration_ms,
        })
    }
}

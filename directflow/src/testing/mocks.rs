//! Closure-backed evaluators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::core::{TimerFiring, TransformResult};
use crate::errors::{EngineError, EngineResult};
use crate::metrics::CounterDeltas;
use crate::model::{Key, UncommittedBundle, WindowedValue};
use crate::runtime::{EvaluationContext, EvaluatorFactory, TransformEvaluator};

/// What one evaluator received.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A run of elements.
    Elements(Vec<WindowedValue>),
    /// A fired timer.
    Timer(TimerFiring),
}

impl Delivery {
    /// Returns the elements, or an empty slice for a timer.
    #[must_use]
    pub fn elements(&self) -> &[WindowedValue] {
        match self {
            Self::Elements(elements) => elements,
            Self::Timer(_) => &[],
        }
    }

    /// Returns the timer firing, if any.
    #[must_use]
    pub fn timer(&self) -> Option<&TimerFiring> {
        match self {
            Self::Timer(firing) => Some(firing),
            Self::Elements(_) => None,
        }
    }
}

type EvaluateFn = dyn Fn(&EvaluationContext, &Delivery) -> EngineResult<TransformResult> + Send + Sync;

/// An evaluator factory whose evaluators run a closure in `finish_bundle`
/// and record every delivery.
#[derive(Clone)]
pub struct FnEvaluatorFactory {
    evaluate: Arc<EvaluateFn>,
    deliveries: Arc<Mutex<Vec<(Key, Delivery)>>>,
}

impl fmt::Debug for FnEvaluatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluatorFactory")
            .field("deliveries", &self.deliveries.lock().len())
            .finish_non_exhaustive()
    }
}

impl FnEvaluatorFactory {
    /// Creates a factory from a closure producing each result.
    #[must_use]
    pub fn new<F>(evaluate: F) -> Self
    where
        F: Fn(&EvaluationContext, &Delivery) -> EngineResult<TransformResult> + Send + Sync + 'static,
    {
        Self {
            evaluate: Arc::new(evaluate),
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Evaluators that produce empty results.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|ctx, _| Ok(TransformResult::empty(Arc::clone(&ctx.transform))))
    }

    /// Evaluators that forward elements to a keyed bundle of `output` and
    /// count them in the `elements` counter.
    #[must_use]
    pub fn forward_to(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::new(move |ctx, delivery| {
            let elements = delivery.elements();
            let bundles = if elements.is_empty() {
                Vec::new()
            } else {
                vec![UncommittedBundle::keyed(output.clone(), ctx.key.clone())
                    .with_elements(elements.iter().cloned())]
            };
            let counters = CounterDeltas::new().with("elements", elements.len() as i64);
            Ok(TransformResult::new(
                Arc::clone(&ctx.transform),
                bundles,
                None,
                counters,
                Default::default(),
            ))
        })
    }

    /// Evaluators that fail with an evaluation error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |ctx, _| {
            Err(EngineError::evaluation(
                ctx.transform.id.clone(),
                ctx.key.clone(),
                message.clone(),
            ))
        })
    }

    /// Returns every delivery so far, in delivery order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(Key, Delivery)> {
        self.deliveries.lock().clone()
    }

    /// Returns the deliveries of one key.
    #[must_use]
    pub fn deliveries_for(&self, key: &Key) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, d)| d.clone())
            .collect()
    }

    /// Returns the number of deliveries so far.
    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }
}

impl EvaluatorFactory for FnEvaluatorFactory {
    fn create_evaluator(&self, ctx: &EvaluationContext) -> EngineResult<Box<dyn TransformEvaluator>> {
        Ok(Box::new(FnEvaluator {
            ctx: ctx.clone(),
            evaluate: Arc::clone(&self.evaluate),
            deliveries: Arc::clone(&self.deliveries),
            delivery: None,
        }))
    }
}

struct FnEvaluator {
    ctx: EvaluationContext,
    evaluate: Arc<EvaluateFn>,
    deliveries: Arc<Mutex<Vec<(Key, Delivery)>>>,
    delivery: Option<Delivery>,
}

impl FnEvaluator {
    fn record(&mut self, key: Key, delivery: Delivery) {
        self.deliveries.lock().push((key, delivery.clone()));
        self.delivery = Some(delivery);
    }
}

#[async_trait]
impl TransformEvaluator for FnEvaluator {
    async fn process_elements(&mut self, key: &Key, elements: Vec<WindowedValue>) -> EngineResult<()> {
        self.record(key.clone(), Delivery::Elements(elements));
        Ok(())
    }

    async fn on_timer(&mut self, firing: TimerFiring) -> EngineResult<()> {
        self.record(firing.key().clone(), Delivery::Timer(firing));
        Ok(())
    }

    async fn finish_bundle(self: Box<Self>) -> EngineResult<TransformResult> {
        let delivery = self
            .delivery
            .as_ref()
            .ok_or_else(|| EngineError::Internal("bundle finished without a delivery".to_string()))?;
        (self.evaluate)(&self.ctx, delivery)
    }
}

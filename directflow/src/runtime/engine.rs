//! The keyed evaluation engine.
//!
//! Work flows through the engine in rounds:
//! 1. Elements are buffered per `(transform, key)` and released as work items.
//! 2. Watermark and processing-time advances move due timers into the key's
//!    queue as timer work items.
//! 3. Every key with queued work is drained by one task; keys run
//!    concurrently, items of one key run one after another.
//! 4. Each result is committed under the key's lock, then its output bundles
//!    are routed to consuming transforms.

use super::buffer::ElementBuffer;
use super::evaluator::{EvaluationContext, EvaluatorFactory};
use super::executor::TransformExecutor;
use super::shard::{KeyShard, ShardRegistry, ShardState};
use crate::config::EngineConfig;
use crate::core::{
    KeyedWorkItem, ScheduledTimer, TimerFiring, TimerId, TimerUpdate, TransformResult, WatermarkHold,
};
use crate::errors::{EngineError, EngineResult, WorkItemError, WorkItemViolation};
use crate::events::{EngineEvent, EventSink, NoOpEventSink};
use crate::metrics::{CounterDeltas, MetricsAggregator};
use crate::model::{
    AppliedTransform, BundleFactory, CommittedBundle, EventTime, Key, ProcessingTime, TransformId,
    UncommittedBundle, WindowedValue,
};
use crate::watermark::{HoldChange, InMemoryWatermarkManager, KeyedHolds, WatermarkManager};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct RegisteredTransform {
    transform: Arc<AppliedTransform>,
    factory: Arc<dyn EvaluatorFactory>,
}

/// What committing one result changed.
#[derive(Debug, Clone)]
pub struct CommittedResult {
    /// The transform that produced the result.
    pub transform: TransformId,
    /// The key the result was produced for.
    pub key: Key,
    /// Output bundles, now committed and visible to consumers.
    pub outputs: Vec<CommittedBundle>,
    /// Elements handed back for redelivery to the same key.
    pub unprocessed: Option<CommittedBundle>,
    /// Counter deltas reported by the evaluation.
    pub counters: CounterDeltas,
    /// The hold the key now requests.
    pub watermark_hold: WatermarkHold,
    /// Change of the transform's minimum hold, if it moved.
    pub hold_change: Option<HoldChange>,
    /// Queued timer deliveries dropped because the timer was set or deleted
    /// again.
    pub superseded_timers: Vec<TimerId>,
    /// Timers that became due and were queued while committing.
    pub fired_timers: Vec<TimerFiring>,
}

impl CommittedResult {
    /// Returns true if the commit produced nothing and moved no watermark.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.outputs.is_empty() && self.unprocessed.is_none() && self.hold_change.is_none()
    }
}

/// Summary of a [`EvaluationEngine::run_until_idle`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Scheduling rounds executed.
    pub rounds: usize,
    /// Work items delivered.
    pub work_items: usize,
    /// Work items that carried a timer firing.
    pub timers_delivered: usize,
    /// Output bundles committed.
    pub bundles_committed: usize,
}

impl RunSummary {
    fn absorb(&mut self, other: Self) {
        self.work_items += other.work_items;
        self.timers_delivered += other.timers_delivered;
        self.bundles_committed += other.bundles_committed;
    }
}

/// Schedules keyed work items and commits their results.
pub struct EvaluationEngine {
    config: EngineConfig,
    transforms: DashMap<TransformId, RegisteredTransform>,
    consumers: DashMap<String, Vec<TransformId>>,
    shards: ShardRegistry,
    buffers: Mutex<HashMap<TransformId, ElementBuffer>>,
    holds: Mutex<HashMap<TransformId, KeyedHolds>>,
    watermarks: Arc<dyn WatermarkManager>,
    metrics: MetricsAggregator,
    bundle_factory: BundleFactory,
    executor: TransformExecutor,
    committed: RwLock<HashMap<String, Vec<CommittedBundle>>>,
    materialized: Mutex<HashMap<String, Vec<WindowedValue>>>,
    processing_time: RwLock<ProcessingTime>,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for EvaluationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationEngine")
            .field("config", &self.config)
            .field("transforms", &self.transforms.len())
            .field("shards", &self.shards.len())
            .field("processing_time", &*self.processing_time.read())
            .finish_non_exhaustive()
    }
}

impl EvaluationEngine {
    /// Creates an engine with an in-memory watermark manager and no event
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the configuration is invalid.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transforms: DashMap::new(),
            consumers: DashMap::new(),
            shards: ShardRegistry::new(),
            buffers: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            watermarks: Arc::new(InMemoryWatermarkManager::new()),
            metrics: MetricsAggregator::new(),
            bundle_factory: BundleFactory::new(),
            executor: TransformExecutor::new(),
            committed: RwLock::new(HashMap::new()),
            materialized: Mutex::new(HashMap::new()),
            processing_time: RwLock::new(ProcessingTime::now()),
            events: Arc::new(NoOpEventSink),
        })
    }

    /// Replaces the watermark manager.
    #[must_use]
    pub fn with_watermark_manager(mut self, watermarks: Arc<dyn WatermarkManager>) -> Self {
        self.watermarks = watermarks;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the initial processing time.
    #[must_use]
    pub fn with_processing_time(self, now: ProcessingTime) -> Self {
        *self.processing_time.write() = now;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the bundle factory used for commits.
    #[must_use]
    pub fn bundle_factory(&self) -> &BundleFactory {
        &self.bundle_factory
    }

    /// Returns committed logical metrics.
    #[must_use]
    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    /// Returns the engine's processing time.
    #[must_use]
    pub fn processing_time(&self) -> ProcessingTime {
        *self.processing_time.read()
    }

    /// Registers a transform and the factory for its evaluators.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the transform is already registered.
    pub fn register_transform(
        &self,
        transform: Arc<AppliedTransform>,
        factory: Arc<dyn EvaluatorFactory>,
    ) -> EngineResult<()> {
        let id = transform.id.clone();
        if self.transforms.contains_key(&id) {
            return Err(EngineError::Config(format!("transform '{id}' is already registered")));
        }
        for input in &transform.inputs {
            self.consumers.entry(input.clone()).or_default().push(id.clone());
        }
        info!(transform = %id, inputs = ?transform.inputs, "Registered transform");
        self.transforms.insert(id, RegisteredTransform { transform, factory });
        Ok(())
    }

    fn registered(&self, transform: &TransformId) -> EngineResult<RegisteredTransform> {
        self.transforms
            .get(transform)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::UnknownTransform(transform.clone()))
    }

    /// Buffers elements for one key of a transform.
    ///
    /// Full buffers are queued immediately; the rest is queued at the start
    /// of the next round.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownTransform` if the transform is not
    /// registered.
    pub async fn submit_elements(
        &self,
        transform: &TransformId,
        key: Key,
        elements: Vec<WindowedValue>,
    ) -> EngineResult<()> {
        self.registered(transform)?;
        let count = elements.len();
        let ready = self.with_buffer(transform, |buffer| buffer.extend(&key, elements));
        self.emit(EngineEvent::elements_buffered(transform, Some(&key), count));
        self.enqueue_all(transform, ready).await;
        Ok(())
    }

    /// Commits an externally produced bundle and routes it to its consumers.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Routing` if an unkeyed bundle holds an element
    /// that is not a key-value pair.
    pub async fn inject_bundle(&self, bundle: UncommittedBundle) -> EngineResult<CommittedBundle> {
        let committed = self.bundle_factory.commit(bundle, self.processing_time());
        self.record_committed(&committed);
        self.route_outputs(std::slice::from_ref(&committed)).await?;
        Ok(committed)
    }

    /// Advances the input watermark of a transform and queues every
    /// event-time timer that became due. Returns the number of timers fired.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownTransform` if the transform is not
    /// registered.
    pub async fn advance_input_watermark(
        &self,
        transform: &TransformId,
        watermark: EventTime,
    ) -> EngineResult<usize> {
        self.registered(transform)?;
        let effective = self.watermarks.advance_input_watermark(transform, watermark);
        let now = self.processing_time();
        let mut fired = 0;
        for shard in self.shards.shards_of(transform) {
            let firings = shard.lock().await.fire_due(effective, now);
            fired += firings.len();
            for firing in &firings {
                self.emit(EngineEvent::timer_fired(transform, firing));
            }
        }
        debug!(transform = %transform, watermark = %effective, fired, "Input watermark advanced");
        Ok(fired)
    }

    /// Advances processing time and queues every timer that became due.
    /// Processing time never moves backwards. Returns the number of timers
    /// fired.
    pub async fn advance_processing_time(&self, now: ProcessingTime) -> usize {
        let now = {
            let mut current = self.processing_time.write();
            if now > *current {
                *current = now;
            }
            *current
        };
        let mut fired = 0;
        for shard in self.shards.all() {
            let watermark = self.watermarks.input_watermark(shard.transform());
            let firings = shard.lock().await.fire_due(watermark, now);
            fired += firings.len();
            for firing in &firings {
                self.emit(EngineEvent::timer_fired(shard.transform(), firing));
            }
        }
        debug!(%now, fired, "Processing time advanced");
        fired
    }

    /// Commits a result produced outside the engine's own scheduling for
    /// `key`, then routes its outputs.
    ///
    /// Logical metrics are committed only if they were attached.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownTransform` if the result's transform is
    /// not registered, `EngineError::WorkItem` if it touches another key's
    /// timers and `EngineError::Routing` if an output cannot be routed.
    pub async fn handle_result(&self, key: &Key, result: TransformResult) -> EngineResult<CommittedResult> {
        self.registered(result.transform_id())?;
        let shard = self.shards.get_or_create(result.transform_id(), key);
        let committed = {
            let mut state = shard.lock().await;
            self.commit_locked(&shard, &mut state, result)?
        };
        self.route_outputs(&committed.outputs).await?;
        Ok(committed)
    }

    /// Runs rounds until no key has queued work and every buffer is empty.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an evaluator or by a commit. Keys
    /// already running in the failing round finish their current item.
    pub async fn run_until_idle(&self) -> EngineResult<RunSummary> {
        let mut summary = RunSummary::default();
        loop {
            self.flush_buffers().await;
            let ready = self.shards.ready();
            if ready.is_empty() {
                break;
            }
            summary.rounds += 1;
            debug!(round = summary.rounds, keys = ready.len(), "Starting round");

            let results: Vec<EngineResult<RunSummary>> = stream::iter(ready)
                .map(|shard| self.drain_shard(shard))
                .buffer_unordered(self.config.max_concurrent_keys)
                .collect()
                .await;
            for result in results {
                summary.absorb(result?);
            }
        }
        info!(
            rounds = summary.rounds,
            work_items = summary.work_items,
            bundles = summary.bundles_committed,
            "Engine idle"
        );
        Ok(summary)
    }

    async fn drain_shard(&self, shard: Arc<KeyShard>) -> EngineResult<RunSummary> {
        let registered = self.registered(shard.transform())?;
        let mut summary = RunSummary::default();
        loop {
            let mut state = shard.lock().await;
            let Some(item) = state.pop_next() else {
                break;
            };
            let ctx = self.evaluation_context(&registered.transform, shard.key());
            let evaluator = registered.factory.create_evaluator(&ctx)?;
            let executed = self
                .executor
                .execute(&registered.transform, item, evaluator)
                .await?;
            self.emit(EngineEvent::work_item_delivered(
                shard.transform(),
                &executed.key,
                executed.was_timer,
                executed.duration_ms,
            ));
            summary.work_items += 1;
            if executed.was_timer {
                summary.timers_delivered += 1;
            }

            let committed = self.commit_locked(&shard, &mut state, executed.result)?;
            drop(state);

            summary.bundles_committed += committed.outputs.len();
            self.route_outputs(&committed.outputs).await?;
        }
        Ok(summary)
    }

    fn evaluation_context(&self, transform: &Arc<AppliedTransform>, key: &Key) -> EvaluationContext {
        EvaluationContext {
            transform: Arc::clone(transform),
            key: key.clone(),
            input_watermark: self.watermarks.input_watermark(&transform.id),
            processing_time: self.processing_time(),
            materialize_all_values: self.config.materialize_all_values,
        }
    }

    /// Commits one result while the key's lock is held.
    ///
    /// A result that sets or deletes another key's timer is rejected before
    /// anything is committed.
    fn commit_locked(
        &self,
        shard: &KeyShard,
        state: &mut ShardState,
        result: TransformResult,
    ) -> EngineResult<CommittedResult> {
        let parts = result.into_parts();
        let transform = parts.transform.id.clone();
        let key = shard.key().clone();
        if let Some(foreign) = foreign_timer(&parts.timer_update, &key) {
            warn!(transform = %transform, key = %key, timer = %foreign, "Rejecting timer of another key");
            return Err(WorkItemError::new(key, WorkItemViolation::KeyMismatch).into());
        }
        let now = self.processing_time();

        let outputs: Vec<CommittedBundle> = parts
            .uncommitted_output_bundles
            .into_iter()
            .map(|bundle| self.bundle_factory.commit(bundle, now))
            .collect();
        for bundle in &outputs {
            self.record_committed(bundle);
            self.emit(EngineEvent::bundle_committed(&transform, bundle));
        }

        let unprocessed = match parts.unprocessed_bundle.filter(|b| !b.is_empty()) {
            Some(bundle) => {
                let bundle = self.bundle_factory.commit(bundle, now);
                let item = KeyedWorkItem::for_elements(key.clone(), bundle.elements.clone())?;
                state.enqueue_front(item);
                debug!(transform = %transform, key = %key, elements = bundle.len(), "Requeued unprocessed elements");
                Some(bundle)
            }
            None => None,
        };

        if let Some(updates) = &parts.logical_metric_updates {
            self.metrics.commit(&transform, updates);
        }

        let superseded_timers = if parts.timer_update.is_empty() {
            Vec::new()
        } else {
            let touched = state.timers.apply(&parts.timer_update);
            for timer in &parts.timer_update.set {
                self.emit(EngineEvent::timer_set(&transform, timer));
            }
            let superseded = state.supersede_queued(&touched);
            for id in &superseded {
                self.emit(EngineEvent::timer_superseded(&transform, id));
            }
            superseded
        };

        state.hold = parts.watermark_hold;
        let hold_change = self
            .holds
            .lock()
            .entry(transform.clone())
            .or_default()
            .update(&key, parts.watermark_hold);
        if let Some(change) = hold_change {
            self.watermarks.update_hold(&transform, change.current);
            self.emit(EngineEvent::hold_updated(&transform, change.current));
        }

        if let Some(values) = parts.undeclared_tag_values {
            if self.config.materialize_all_values {
                let mut materialized = self.materialized.lock();
                for (tag, values) in values {
                    materialized.entry(tag).or_default().extend(values);
                }
            } else {
                warn!(transform = %transform, "Dropping undeclared values; materialization is disabled");
            }
        }

        let fired_timers = state.fire_due(self.watermarks.input_watermark(&transform), now);
        for firing in &fired_timers {
            self.emit(EngineEvent::timer_fired(&transform, firing));
        }

        Ok(CommittedResult {
            transform,
            key,
            outputs,
            unprocessed,
            counters: parts.counters,
            watermark_hold: parts.watermark_hold,
            hold_change,
            superseded_timers,
            fired_timers,
        })
    }

    fn record_committed(&self, bundle: &CommittedBundle) {
        self.committed
            .write()
            .entry(bundle.pcollection.clone())
            .or_default()
            .push(bundle.clone());
    }

    async fn route_outputs(&self, bundles: &[CommittedBundle]) -> EngineResult<()> {
        for bundle in bundles {
            let consumers = self
                .consumers
                .get(&bundle.pcollection)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();
            if consumers.is_empty() {
                continue;
            }
            let keyed = keyed_elements(bundle)?;
            for consumer in consumers {
                let ready: Vec<KeyedWorkItem> = self.with_buffer(&consumer, |buffer| {
                    keyed
                        .iter()
                        .filter_map(|(key, element)| buffer.push(key, element.clone()))
                        .collect()
                });
                self.emit(EngineEvent::elements_buffered(&consumer, bundle.key.as_ref(), keyed.len()));
                self.enqueue_all(&consumer, ready).await;
            }
        }
        Ok(())
    }

    fn with_buffer<R>(&self, transform: &TransformId, f: impl FnOnce(&mut ElementBuffer) -> R) -> R {
        let mut buffers = self.buffers.lock();
        let buffer = buffers
            .entry(transform.clone())
            .or_insert_with(|| ElementBuffer::new(self.config.max_bundle_size));
        f(buffer)
    }

    async fn flush_buffers(&self) {
        let flushed: Vec<(TransformId, Vec<KeyedWorkItem>)> = self
            .buffers
            .lock()
            .iter_mut()
            .map(|(transform, buffer)| (transform.clone(), buffer.flush()))
            .collect();
        for (transform, items) in flushed {
            self.enqueue_all(&transform, items).await;
        }
    }

    async fn enqueue_all(&self, transform: &TransformId, items: Vec<KeyedWorkItem>) {
        for item in items {
            let shard = self.shards.get_or_create(transform, item.key());
            shard.lock().await.enqueue(item);
        }
    }

    fn emit(&self, event: EngineEvent) {
        self.events.publish(event);
    }

    /// Returns every bundle committed to a collection, in commit order.
    #[must_use]
    pub fn committed_bundles(&self, pcollection: &str) -> Vec<CommittedBundle> {
        self.committed.read().get(pcollection).cloned().unwrap_or_default()
    }

    /// Returns every element committed to a collection.
    #[must_use]
    pub fn committed_values(&self, pcollection: &str) -> Vec<WindowedValue> {
        self.committed
            .read()
            .get(pcollection)
            .map(|bundles| bundles.iter().flat_map(|b| b.elements.iter().cloned()).collect())
            .unwrap_or_default()
    }

    /// Returns the undeclared values kept for a tag.
    #[must_use]
    pub fn materialized_values(&self, tag: &str) -> Vec<WindowedValue> {
        self.materialized.lock().get(tag).cloned().unwrap_or_default()
    }

    /// Returns the input watermark of a transform.
    #[must_use]
    pub fn input_watermark(&self, transform: &TransformId) -> EventTime {
        self.watermarks.input_watermark(transform)
    }

    /// Returns the output watermark of a transform.
    #[must_use]
    pub fn output_watermark(&self, transform: &TransformId) -> EventTime {
        self.watermarks.output_watermark(transform)
    }

    /// Returns the hold currently requested by one key.
    #[must_use]
    pub fn key_hold(&self, transform: &TransformId, key: &Key) -> Option<EventTime> {
        self.holds.lock().get(transform).and_then(|holds| holds.get(key))
    }

    /// Returns the number of pending timers of one key.
    pub async fn pending_timers(&self, transform: &TransformId, key: &Key) -> usize {
        let Some(shard) = self.shards.get(transform, key) else {
            return 0;
        };
        let state = shard.lock().await;
        state.timers.len()
    }

    /// Returns the number of work items queued for one key.
    #[must_use]
    pub fn queued_work_items(&self, transform: &TransformId, key: &Key) -> usize {
        self.shards.get(transform, key).map_or(0, |shard| shard.pending())
    }
}

fn foreign_timer<'a>(update: &'a TimerUpdate, key: &Key) -> Option<&'a TimerId> {
    update
        .deleted
        .iter()
        .chain(update.set.iter().map(ScheduledTimer::id))
        .find(|id| &id.key != key)
}

fn keyed_elements(bundle: &CommittedBundle) -> EngineResult<Vec<(Key, WindowedValue)>> {
    match &bundle.key {
        Some(key) => Ok(bundle.elements.iter().map(|e| (key.clone(), e.clone())).collect()),
        None => bundle
            .elements
            .iter()
            .map(|element| {
                element.split_kv().ok_or_else(|| {
                    EngineError::Routing(format!(
                        "unkeyed bundle of '{}' holds an element that is not a [string key, value] pair",
                        bundle.pcollection
                    ))
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnEvaluatorFactory;
    use crate::watermark::MockWatermarkManager;

    #[tokio::test]
    async fn test_noop_result_requests_no_hold_update() {
        let mut watermarks = MockWatermarkManager::new();
        watermarks.expect_update_hold().times(0);
        watermarks
            .expect_input_watermark()
            .returning(|_| EventTime::MIN);

        let engine = EvaluationEngine::new(EngineConfig::default())
            .unwrap()
            .with_watermark_manager(Arc::new(watermarks));
        let transform = AppliedTransform::new("ParDo(Noop)").shared();
        engine
            .register_transform(Arc::clone(&transform), Arc::new(FnEvaluatorFactory::noop()))
            .unwrap();

        let committed = engine
            .handle_result(&Key::from("k"), TransformResult::empty(transform))
            .await
            .unwrap();

        assert!(committed.is_noop());
        assert!(committed.fired_timers.is_empty());
    }

    #[tokio::test]
    async fn test_hold_change_reaches_manager_once() {
        let mut watermarks = MockWatermarkManager::new();
        watermarks
            .expect_update_hold()
            .withf(|t, hold| t.as_str() == "ParDo(Hold)" && *hold == Some(EventTime::from_millis(5)))
            .times(1)
            .return_const(());
        watermarks
            .expect_input_watermark()
            .returning(|_| EventTime::MIN);

        let engine = EvaluationEngine::new(EngineConfig::default())
            .unwrap()
            .with_watermark_manager(Arc::new(watermarks));
        let transform = AppliedTransform::new("ParDo(Hold)").shared();
        engine
            .register_transform(Arc::clone(&transform), Arc::new(FnEvaluatorFactory::noop()))
            .unwrap();
        let held = || {
            TransformResult::new(
                Arc::clone(&transform),
                Vec::new(),
                None,
                CounterDeltas::new(),
                WatermarkHold::At(EventTime::from_millis(5)),
            )
        };

        let first = engine.handle_result(&Key::from("k"), held()).await.unwrap();
        let second = engine.handle_result(&Key::from("k"), held()).await.unwrap();

        assert!(first.hold_change.is_some());
        assert!(second.hold_change.is_none());
        assert!(second.is_noop());
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let engine = EvaluationEngine::new(EngineConfig::default()).unwrap();
        let transform = AppliedTransform::new("t").shared();
        engine
            .register_transform(Arc::clone(&transform), Arc::new(FnEvaluatorFactory::noop()))
            .unwrap();

        let err = engine
            .register_transform(transform, Arc::new(FnEvaluatorFactory::noop()))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[tokio::test]
    async fn test_unknown_transform() {
        let engine = EvaluationEngine::new(EngineConfig::default()).unwrap();
        let err = engine
            .submit_elements(&TransformId::from("missing"), Key::from("k"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownTransform(_)));
    }

    #[test]
    fn test_unkeyed_bundle_requires_kv_elements() {
        let bundle = BundleFactory::new().commit(
            UncommittedBundle::new("pc").with_element(WindowedValue::in_global_window(serde_json::json!(1))),
            ProcessingTime::now(),
        );
        assert!(matches!(keyed_elements(&bundle), Err(EngineError::Routing(_))));
    }
}

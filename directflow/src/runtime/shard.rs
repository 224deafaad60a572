//! Per-key execution shards.
//!
//! Every `(transform, key)` pair owns one shard. The shard's lock is held for
//! the whole evaluation and commitment of a work item, which gives per-key
//! serial execution while different keys run concurrently.

use crate::core::{KeyedWorkItem, TimerFiring, TimerId, WatermarkHold};
use crate::model::{EventTime, Key, ProcessingTime, TransformId};
use crate::timers::TimerTable;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Mutable state of one key, guarded by the shard lock.
#[derive(Debug)]
pub struct ShardState {
    /// Pending timers of the key.
    pub timers: TimerTable,
    /// The most recent hold reported for the key.
    pub hold: WatermarkHold,
    queue: VecDeque<KeyedWorkItem>,
    pending: Arc<AtomicUsize>,
    delivered: u64,
}

impl ShardState {
    fn new(pending: Arc<AtomicUsize>) -> Self {
        Self {
            timers: TimerTable::new(),
            hold: WatermarkHold::None,
            queue: VecDeque::new(),
            pending,
            delivered: 0,
        }
    }

    fn sync_pending(&self) {
        self.pending.store(self.queue.len(), Ordering::Release);
    }

    /// Queues a work item behind everything already queued.
    pub fn enqueue(&mut self, item: KeyedWorkItem) {
        self.queue.push_back(item);
        self.sync_pending();
    }

    /// Queues a work item ahead of everything already queued.
    pub fn enqueue_front(&mut self, item: KeyedWorkItem) {
        self.queue.push_front(item);
        self.sync_pending();
    }

    /// Takes the next work item to deliver.
    pub fn pop_next(&mut self) -> Option<KeyedWorkItem> {
        let item = self.queue.pop_front()?;
        self.delivered += 1;
        self.sync_pending();
        Some(item)
    }

    /// Number of queued work items.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of work items taken for delivery so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Moves every due timer out of the table and queues it for delivery.
    ///
    /// Event-time timers fire before processing-time timers.
    pub fn fire_due(&mut self, watermark: EventTime, now: ProcessingTime) -> Vec<TimerFiring> {
        let mut fired = self.timers.extract_fired_event_time(watermark);
        fired.extend(self.timers.extract_fired_processing_time(now));
        for firing in &fired {
            self.queue.push_back(KeyedWorkItem::from_firing(firing.clone()));
        }
        self.sync_pending();
        fired
    }

    /// Drops queued timer deliveries whose identity was set or deleted again.
    ///
    /// Returns the identities whose queued delivery was dropped.
    pub fn supersede_queued(&mut self, touched: &[TimerId]) -> Vec<TimerId> {
        if touched.is_empty() {
            return Vec::new();
        }
        let mut superseded = Vec::new();
        self.queue.retain(|item| match item.timer_firing() {
            Some(firing) if touched.iter().any(|id| firing.id() == *id) => {
                superseded.push(firing.id());
                false
            }
            _ => true,
        });
        self.sync_pending();
        superseded
    }
}

/// The execution shard of one key of one transform.
#[derive(Debug)]
pub struct KeyShard {
    transform: TransformId,
    key: Key,
    pending: Arc<AtomicUsize>,
    state: Mutex<ShardState>,
}

impl KeyShard {
    /// Creates an empty shard.
    #[must_use]
    pub fn new(transform: TransformId, key: Key) -> Self {
        let pending = Arc::new(AtomicUsize::new(0));
        Self {
            transform,
            key,
            state: Mutex::new(ShardState::new(Arc::clone(&pending))),
            pending,
        }
    }

    /// The transform the shard belongs to.
    #[must_use]
    pub fn transform(&self) -> &TransformId {
        &self.transform
    }

    /// The key the shard belongs to.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Number of queued work items, readable without the lock.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Acquires the shard lock.
    pub async fn lock(&self) -> MutexGuard<'_, ShardState> {
        self.state.lock().await
    }
}

/// All shards of the engine, created on first use.
#[derive(Debug, Default)]
pub struct ShardRegistry {
    shards: DashMap<(TransformId, Key), Arc<KeyShard>>,
}

impl ShardRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shard for a key, creating it if needed.
    pub fn get_or_create(&self, transform: &TransformId, key: &Key) -> Arc<KeyShard> {
        let entry = self
            .shards
            .entry((transform.clone(), key.clone()))
            .or_insert_with(|| {
                debug!(transform = %transform, key = %key, "Creating key shard");
                Arc::new(KeyShard::new(transform.clone(), key.clone()))
            });
        Arc::clone(entry.value())
    }

    /// Returns the shard for a key if it exists.
    #[must_use]
    pub fn get(&self, transform: &TransformId, key: &Key) -> Option<Arc<KeyShard>> {
        self.shards
            .get(&(transform.clone(), key.clone()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Returns every shard of a transform.
    #[must_use]
    pub fn shards_of(&self, transform: &TransformId) -> Vec<Arc<KeyShard>> {
        self.shards
            .iter()
            .filter(|entry| &entry.key().0 == transform)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Returns every shard with queued work.
    #[must_use]
    pub fn ready(&self) -> Vec<Arc<KeyShard>> {
        self.shards
            .iter()
            .filter(|entry| entry.value().pending() > 0)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Returns every shard.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<KeyShard>> {
        self.shards.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Number of shards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Returns true if no shard exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ScheduledTimer, TimerUpdate};
    use crate::model::{BoundedWindow, WindowedValue};

    fn elements_item(key: &str, n: i64) -> KeyedWorkItem {
        KeyedWorkItem::for_elements(
            Key::from(key),
            vec![WindowedValue::in_global_window(serde_json::json!(n))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_queue_is_fifo_and_pending_tracks_it() {
        let shard = KeyShard::new(TransformId::from("t"), Key::from("k"));
        {
            let mut state = shard.lock().await;
            state.enqueue(elements_item("k", 1));
            state.enqueue(elements_item("k", 2));
        }
        assert_eq!(shard.pending(), 2);

        let mut state = shard.lock().await;
        let first = state.pop_next().unwrap();
        assert_eq!(first.elements()[0].value, serde_json::json!(1));
        assert_eq!(state.delivered(), 1);
        drop(state);
        assert_eq!(shard.pending(), 1);
    }

    #[tokio::test]
    async fn test_fire_due_queues_timers() {
        let shard = KeyShard::new(TransformId::from("t"), Key::from("k"));
        let mut state = shard.lock().await;
        state.timers.set(ScheduledTimer::event_time(
            Key::from("k"),
            BoundedWindow::Global,
            "flush",
            EventTime::from_millis(10),
        ));

        assert!(state
            .fire_due(EventTime::from_millis(10), ProcessingTime::now())
            .is_empty());
        let fired = state.fire_due(EventTime::from_millis(11), ProcessingTime::now());
        assert_eq!(fired.len(), 1);
        assert_eq!(state.queued(), 1);
        assert!(state.pop_next().unwrap().is_timer());
    }

    #[tokio::test]
    async fn test_supersede_drops_only_touched_timers() {
        let shard = KeyShard::new(TransformId::from("t"), Key::from("k"));
        let mut state = shard.lock().await;
        let timer = ScheduledTimer::event_time(
            Key::from("k"),
            BoundedWindow::Global,
            "flush",
            EventTime::from_millis(1),
        );
        let id = timer.id().clone();
        state.timers.set(timer);
        state.enqueue(elements_item("k", 1));
        state.fire_due(EventTime::MAX, ProcessingTime::now());
        assert_eq!(state.queued(), 2);

        let touched = state.timers.apply(&TimerUpdate::new().with_deleted(id.clone()));
        let superseded = state.supersede_queued(&touched);

        assert_eq!(superseded, vec![id]);
        assert_eq!(state.queued(), 1);
        assert!(!state.pop_next().unwrap().is_timer());
    }

    #[test]
    fn test_registry_reuses_shards() {
        let registry = ShardRegistry::new();
        let t = TransformId::from("t");
        let a = registry.get_or_create(&t, &Key::from("a"));
        let again = registry.get_or_create(&t, &Key::from("a"));
        registry.get_or_create(&TransformId::from("other"), &Key::from("a"));

        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.shards_of(&t).len(), 1);
        assert!(registry.ready().is_empty());
    }
}

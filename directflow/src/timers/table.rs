//! Pending timers of one key.

use crate::core::{ScheduledTimer, TimeDomain, TimerFiring, TimerId, TimerTimestamp, TimerUpdate};
use crate::model::{EventTime, ProcessingTime};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    timestamp: TimerTimestamp,
    seq: u64,
}

/// The pending timers of a single key, addressed by timer identity.
///
/// Not synchronized: the owning key shard serializes every access, so a set
/// or delete can never interleave with the extraction of fired timers.
#[derive(Debug, Default)]
pub struct TimerTable {
    pending: HashMap<TimerId, PendingTimer>,
    next_seq: u64,
}

impl TimerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a timer, replacing any pending timer with the same identity.
    ///
    /// Returns the deadline of the replaced timer.
    pub fn set(&mut self, timer: ScheduledTimer) -> Option<TimerTimestamp> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let timestamp = timer.timestamp();
        let previous = self
            .pending
            .insert(timer.id().clone(), PendingTimer { timestamp, seq })
            .map(|p| p.timestamp);
        trace!(timer = %timer.id(), %timestamp, replaced = previous.is_some(), "Timer set");
        previous
    }

    /// Deletes a pending timer. Returns true if one was pending.
    pub fn delete(&mut self, id: &TimerId) -> bool {
        let removed = self.pending.remove(id).is_some();
        trace!(timer = %id, removed, "Timer deleted");
        removed
    }

    /// Applies an evaluation's timer update: deletions first, then sets.
    ///
    /// Returns every identity the update touched.
    pub fn apply(&mut self, update: &TimerUpdate) -> Vec<TimerId> {
        let mut touched = Vec::with_capacity(update.deleted.len() + update.set.len());
        for id in &update.deleted {
            self.delete(id);
            touched.push(id.clone());
        }
        for timer in &update.set {
            self.set(timer.clone());
            touched.push(timer.id().clone());
        }
        touched
    }

    /// Removes and returns every event-time timer strictly before `watermark`,
    /// earliest first.
    pub fn extract_fired_event_time(&mut self, watermark: EventTime) -> Vec<TimerFiring> {
        self.extract(TimeDomain::EventTime, |at| {
            at.as_event_time().is_some_and(|t| t < watermark)
        })
    }

    /// Removes and returns every processing-time timer strictly before `now`,
    /// earliest first.
    pub fn extract_fired_processing_time(&mut self, now: ProcessingTime) -> Vec<TimerFiring> {
        self.extract(TimeDomain::ProcessingTime, |at| {
            at.as_processing_time().is_some_and(|t| t < now)
        })
    }

    fn extract<F>(&mut self, domain: TimeDomain, is_due: F) -> Vec<TimerFiring>
    where
        F: Fn(&TimerTimestamp) -> bool,
    {
        let due: Vec<TimerId> = self
            .pending
            .iter()
            .filter(|(id, pending)| id.domain == domain && is_due(&pending.timestamp))
            .map(|(id, _)| id.clone())
            .collect();

        let mut fired: Vec<(TimerId, PendingTimer)> = due
            .into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|pending| (id, pending)))
            .collect();
        fired.sort_by(|(_, a), (_, b)| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));

        fired
            .into_iter()
            .map(|(id, pending)| ScheduledTimer::from_parts(id, pending.timestamp).fire())
            .collect()
    }

    /// Returns the deadline of a pending timer.
    #[must_use]
    pub fn get(&self, id: &TimerId) -> Option<TimerTimestamp> {
        self.pending.get(id).map(|p| p.timestamp)
    }

    /// Returns the earliest pending deadline in a domain.
    #[must_use]
    pub fn next_deadline(&self, domain: TimeDomain) -> Option<TimerTimestamp> {
        self.pending
            .iter()
            .filter(|(id, _)| id.domain == domain)
            .map(|(_, p)| p.timestamp)
            .min()
    }

    /// Returns the number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

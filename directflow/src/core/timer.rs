//! Timer identities, scheduled timers and timer firings.

use crate::errors::TimeDomainMismatchError;
use crate::model::{BoundedWindow, EventTime, Key, ProcessingTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The clock that drives a timer toward firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDomain {
    /// Driven by the input watermark.
    EventTime,
    /// Driven by the wall clock.
    ProcessingTime,
}

impl fmt::Display for TimeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventTime => write!(f, "event_time"),
            Self::ProcessingTime => write!(f, "processing_time"),
        }
    }
}

/// A timer deadline expressed on one of the two clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "domain", content = "at", rename_all = "snake_case")]
pub enum TimerTimestamp {
    /// An event-time deadline.
    Event(EventTime),
    /// A processing-time deadline.
    Processing(ProcessingTime),
}

impl TimerTimestamp {
    /// Returns the domain the value belongs to.
    #[must_use]
    pub const fn domain(&self) -> TimeDomain {
        match self {
            Self::Event(_) => TimeDomain::EventTime,
            Self::Processing(_) => TimeDomain::ProcessingTime,
        }
    }

    /// Returns the event-time value, if this is an event-time deadline.
    #[must_use]
    pub const fn as_event_time(&self) -> Option<EventTime> {
        match self {
            Self::Event(at) => Some(*at),
            Self::Processing(_) => None,
        }
    }

    /// Returns the processing-time value, if this is a processing-time deadline.
    #[must_use]
    pub const fn as_processing_time(&self) -> Option<ProcessingTime> {
        match self {
            Self::Processing(at) => Some(*at),
            Self::Event(_) => None,
        }
    }
}

impl fmt::Display for TimerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(at) => write!(f, "{at}"),
            Self::Processing(at) => write!(f, "{at}"),
        }
    }
}

/// The identity of a timer: `(key, window, name, time domain)`.
///
/// Setting a timer whose identity is already pending replaces it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId {
    /// The key the timer is scoped to.
    pub key: Key,
    /// The window the timer is scoped to.
    pub window: BoundedWindow,
    /// The timer name within its `(key, window)` scope.
    pub name: String,
    /// The clock driving the timer.
    pub domain: TimeDomain,
}

impl TimerId {
    /// Creates a timer identity.
    #[must_use]
    pub fn new(key: Key, window: BoundedWindow, name: impl Into<String>, domain: TimeDomain) -> Self {
        Self {
            key,
            window,
            name: name.into(),
            domain,
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{}", self.key, self.window, self.name, self.domain)
    }
}

/// A timer that has been set but not yet fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTimer {
    id: TimerId,
    timestamp: TimerTimestamp,
}

impl ScheduledTimer {
    /// Schedules a timer.
    ///
    /// # Errors
    ///
    /// Returns `TimeDomainMismatchError` if the timestamp belongs to a
    /// different clock than the timer's domain.
    pub fn new(id: TimerId, timestamp: TimerTimestamp) -> Result<Self, TimeDomainMismatchError> {
        if timestamp.domain() != id.domain {
            return Err(TimeDomainMismatchError::new(
                id.name,
                id.domain,
                timestamp.domain(),
            ));
        }
        Ok(Self { id, timestamp })
    }

    /// Schedules an event-time timer.
    #[must_use]
    pub fn event_time(key: Key, window: BoundedWindow, name: impl Into<String>, at: EventTime) -> Self {
        Self {
            id: TimerId::new(key, window, name, TimeDomain::EventTime),
            timestamp: TimerTimestamp::Event(at),
        }
    }

    /// Schedules a processing-time timer.
    #[must_use]
    pub fn processing_time(
        key: Key,
        window: BoundedWindow,
        name: impl Into<String>,
        at: ProcessingTime,
    ) -> Self {
        Self {
            id: TimerId::new(key, window, name, TimeDomain::ProcessingTime),
            timestamp: TimerTimestamp::Processing(at),
        }
    }

    /// Rebuilds a timer from parts that were validated when first scheduled.
    pub(crate) fn from_parts(id: TimerId, timestamp: TimerTimestamp) -> Self {
        debug_assert_eq!(id.domain, timestamp.domain());
        Self { id, timestamp }
    }

    /// Returns the timer identity.
    #[must_use]
    pub fn id(&self) -> &TimerId {
        &self.id
    }

    /// Returns the deadline.
    #[must_use]
    pub fn timestamp(&self) -> TimerTimestamp {
        self.timestamp
    }

    /// Turns the timer into a firing once its deadline has been reached.
    #[must_use]
    pub fn fire(self) -> TimerFiring {
        TimerFiring {
            key: self.id.key,
            window: self.id.window,
            name: self.id.name,
            time_domain: self.id.domain,
            timestamp: self.timestamp,
        }
    }
}

/// A single timer that has reached its firing time.
///
/// Equality and hashing use the timer identity only; the timestamp is the
/// firing value, not part of who the timer is.
#[derive(Debug, Clone, Serialize)]
pub struct TimerFiring {
    key: Key,
    window: BoundedWindow,
    name: String,
    time_domain: TimeDomain,
    timestamp: TimerTimestamp,
}

impl TimerFiring {
    /// Creates a timer firing.
    ///
    /// # Errors
    ///
    /// Returns `TimeDomainMismatchError` if `timestamp` is not a value of
    /// `time_domain`'s clock.
    pub fn new(
        key: Key,
        window: BoundedWindow,
        name: impl Into<String>,
        time_domain: TimeDomain,
        timestamp: TimerTimestamp,
    ) -> Result<Self, TimeDomainMismatchError> {
        let name = name.into();
        if timestamp.domain() != time_domain {
            return Err(TimeDomainMismatchError::new(
                name,
                time_domain,
                timestamp.domain(),
            ));
        }
        Ok(Self {
            key,
            window,
            name,
            time_domain,
            timestamp,
        })
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the window.
    #[must_use]
    pub fn window(&self) -> &BoundedWindow {
        &self.window
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the time domain.
    #[must_use]
    pub fn time_domain(&self) -> TimeDomain {
        self.time_domain
    }

    /// Returns the firing timestamp.
    #[must_use]
    pub fn timestamp(&self) -> TimerTimestamp {
        self.timestamp
    }

    /// Returns the timer identity.
    #[must_use]
    pub fn id(&self) -> TimerId {
        TimerId::new(
            self.key.clone(),
            self.window,
            self.name.clone(),
            self.time_domain,
        )
    }

    fn identity(&self) -> (&Key, &BoundedWindow, &str, TimeDomain) {
        (&self.key, &self.window, &self.name, self.time_domain)
    }
}

impl PartialEq for TimerFiring {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for TimerFiring {}

impl Hash for TimerFiring {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for TimerFiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}={}",
            self.key, self.window, self.name, self.time_domain, self.timestamp
        )
    }
}

/// Timer changes requested by one evaluation.
///
/// Deletions are applied before sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimerUpdate {
    /// Timers to set or reset.
    pub set: Vec<ScheduledTimer>,
    /// Timers to cancel.
    pub deleted: Vec<TimerId>,
}

impl TimerUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a timer to set, builder style.
    #[must_use]
    pub fn with_set(mut self, timer: ScheduledTimer) -> Self {
        self.set.push(timer);
        self
    }

    /// Adds a timer to delete, builder style.
    #[must_use]
    pub fn with_deleted(mut self, id: TimerId) -> Self {
        self.deleted.push(id);
        self
    }

    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn firing(name: &str, at: i64) -> TimerFiring {
        TimerFiring::new(
            Key::from("k1"),
            BoundedWindow::Global,
            name,
            TimeDomain::EventTime,
            TimerTimestamp::Event(EventTime::from_millis(at)),
        )
        .unwrap()
    }

    #[test]
    fn test_firing_rejects_processing_timestamp_in_event_domain() {
        let err = TimerFiring::new(
            Key::from("k1"),
            BoundedWindow::Global,
            "expiry",
            TimeDomain::EventTime,
            TimerTimestamp::Processing(ProcessingTime::now()),
        )
        .unwrap_err();

        assert_eq!(err.declared, TimeDomain::EventTime);
        assert_eq!(err.actual, TimeDomain::ProcessingTime);
    }

    #[test]
    fn test_firing_rejects_event_timestamp_in_processing_domain() {
        let result = TimerFiring::new(
            Key::from("k1"),
            BoundedWindow::Global,
            "poll",
            TimeDomain::ProcessingTime,
            TimerTimestamp::Event(EventTime::from_millis(1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_firing_identity_ignores_timestamp() {
        let early = firing("expiry", 10);
        let late = firing("expiry", 20);
        assert_eq!(early, late);
        assert_eq!(early.id(), late.id());

        let set: HashSet<TimerFiring> = [early, late].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_firing_identity_includes_domain_and_name() {
        let event = firing("expiry", 10);
        let other_name = firing("cleanup", 10);
        let processing = TimerFiring::new(
            Key::from("k1"),
            BoundedWindow::Global,
            "expiry",
            TimeDomain::ProcessingTime,
            TimerTimestamp::Processing(ProcessingTime::now()),
        )
        .unwrap();

        assert_ne!(event, other_name);
        assert_ne!(event, processing);
    }

    #[test]
    fn test_scheduled_timer_validates_domain() {
        let id = TimerId::new(
            Key::from("k1"),
            BoundedWindow::Global,
            "expiry",
            TimeDomain::EventTime,
        );
        assert!(ScheduledTimer::new(id.clone(), TimerTimestamp::Processing(ProcessingTime::now())).is_err());

        let timer = ScheduledTimer::new(id.clone(), TimerTimestamp::Event(EventTime::from_millis(5))).unwrap();
        let fired = timer.fire();
        assert_eq!(fired.id(), id);
        assert_eq!(fired.timestamp().as_event_time(), Some(EventTime::from_millis(5)));
    }

    #[test]
    fn test_timer_update_is_empty() {
        assert!(TimerUpdate::new().is_empty());
        let update = TimerUpdate::new().with_deleted(firing("expiry", 1).id());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_time_domain_display() {
        assert_eq!(TimeDomain::EventTime.to_string(), "event_time");
        assert_eq!(TimeDomain::ProcessingTime.to_string(), "processing_time");
    }
}

//! The scheduling envelope delivered to keyed transforms.

use super::TimerFiring;
use crate::errors::{WorkItemError, WorkItemViolation};
use crate::model::{Key, WindowedValue};
use serde::Serialize;

/// The payload of a keyed work item: a fired timer or buffered elements,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum WorkPayload {
    /// Run the timer callback.
    Timer(TimerFiring),
    /// Process buffered elements, in order. Never empty.
    Elements(Vec<WindowedValue>),
}

/// A unit of keyed work.
///
/// Every constructor validates the payload, so a value of this type always
/// carries exactly one of a timer firing or a non-empty run of elements.
/// It implements `Serialize` only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedWorkItem {
    key: Key,
    payload: WorkPayload,
}

impl KeyedWorkItem {
    /// Builds a work item from an optional timer firing and an element list.
    ///
    /// # Errors
    ///
    /// Returns `WorkItemError` when both payloads are absent, when both are
    /// present, or when the timer belongs to another key.
    pub fn new(
        key: Key,
        timer_firing: Option<TimerFiring>,
        elements: Vec<WindowedValue>,
    ) -> Result<Self, WorkItemError> {
        match (timer_firing, elements.is_empty()) {
            (None, true) => Err(WorkItemError::new(key, WorkItemViolation::EmptyPayload)),
            (Some(_), false) => Err(WorkItemError::new(key, WorkItemViolation::AmbiguousPayload)),
            (Some(firing), true) => Self::for_timer(key, firing),
            (None, false) => Self::for_elements(key, elements),
        }
    }

    /// Builds an elements work item.
    ///
    /// # Errors
    ///
    /// Returns `WorkItemError` if `elements` is empty.
    pub fn for_elements(key: Key, elements: Vec<WindowedValue>) -> Result<Self, WorkItemError> {
        if elements.is_empty() {
            return Err(WorkItemError::new(key, WorkItemViolation::EmptyPayload));
        }
        Ok(Self {
            key,
            payload: WorkPayload::Elements(elements),
        })
    }

    /// Builds a timer work item.
    ///
    /// # Errors
    ///
    /// Returns `WorkItemError` if the firing's key differs from `key`.
    pub fn for_timer(key: Key, firing: TimerFiring) -> Result<Self, WorkItemError> {
        if firing.key() != &key {
            return Err(WorkItemError::new(key, WorkItemViolation::KeyMismatch));
        }
        Ok(Self {
            key,
            payload: WorkPayload::Timer(firing),
        })
    }

    /// Wraps a fired timer, taking the key from the firing itself.
    #[must_use]
    pub fn from_firing(firing: TimerFiring) -> Self {
        Self {
            key: firing.key().clone(),
            payload: WorkPayload::Timer(firing),
        }
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the timer firing, if this item carries one.
    #[must_use]
    pub fn timer_firing(&self) -> Option<&TimerFiring> {
        match &self.payload {
            WorkPayload::Timer(firing) => Some(firing),
            WorkPayload::Elements(_) => None,
        }
    }

    /// Returns the elements. Empty for timer items.
    #[must_use]
    pub fn elements(&self) -> &[WindowedValue] {
        match &self.payload {
            WorkPayload::Elements(elements) => elements,
            WorkPayload::Timer(_) => &[],
        }
    }

    /// Returns true if this item carries a timer firing.
    #[must_use]
    pub fn is_timer(&self) -> bool {
        matches!(self.payload, WorkPayload::Timer(_))
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &WorkPayload {
        &self.payload
    }

    /// Consumes the item, returning its key and payload.
    #[must_use]
    pub fn into_parts(self) -> (Key, WorkPayload) {
        (self.key, self.payload)
    }
}

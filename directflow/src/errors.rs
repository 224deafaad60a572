//! Error types for the directflow engine.
//!
//! Construction errors are returned at the call site that built the offending
//! value. They are never carried along as data inside a work item or result.

use crate::core::TimeDomain;
use crate::model::{Key, TransformId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A keyed work item was built with an invalid payload.
    #[error("{0}")]
    WorkItem(#[from] WorkItemError),

    /// A timer firing was built with a timestamp from the wrong clock.
    #[error("{0}")]
    TimeDomainMismatch(#[from] TimeDomainMismatchError),

    /// Logical metrics were attached to the same result twice.
    #[error("{0}")]
    DoubleMetricsAttachment(#[from] MetricsAlreadyAttachedError),

    /// A transform was referenced that the engine does not know about.
    #[error("Unknown transform: {0}")]
    UnknownTransform(TransformId),

    /// An evaluator failed while processing a work item.
    #[error("Evaluation of '{transform}' failed for key '{key}': {message}")]
    Evaluation {
        /// The transform being evaluated.
        transform: TransformId,
        /// The key of the work item.
        key: Key,
        /// The evaluator's message.
        message: String,
    },

    /// A committed bundle could not be routed to a consuming transform.
    #[error("Routing error: {0}")]
    Routing(String),

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates an evaluation error.
    #[must_use]
    pub fn evaluation(transform: TransformId, key: Key, message: impl Into<String>) -> Self {
        Self::Evaluation {
            transform,
            key,
            message: message.into(),
        }
    }

    /// Returns true for errors that indicate a bug in the engine or its
    /// callers rather than a failure of user code.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WorkItem(_)
                | Self::TimeDomainMismatch(_)
                | Self::DoubleMetricsAttachment(_)
                | Self::Internal(_)
        )
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let kind = match self {
            Self::WorkItem(_) => "WorkItemError",
            Self::TimeDomainMismatch(_) => "TimeDomainMismatch",
            Self::DoubleMetricsAttachment(_) => "DoubleMetricsAttachment",
            Self::UnknownTransform(_) => "UnknownTransform",
            Self::Evaluation { .. } => "EvaluationError",
            Self::Routing(_) => "RoutingError",
            Self::Config(_) => "ConfigError",
            Self::Internal(_) => "InternalError",
        };
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("fatal".to_string(), serde_json::json!(self.is_fatal()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Reason a keyed work item could not be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemViolation {
    /// Neither a timer firing nor any elements were supplied.
    EmptyPayload,
    /// A timer firing and elements were supplied together.
    AmbiguousPayload,
    /// A timer firing or timer update belongs to a different key than the
    /// work item.
    KeyMismatch,
}

/// Error raised when a keyed work item violates its payload invariant.
#[derive(Debug, Clone, Error)]
#[error("Invalid work item for key '{key}': {}", violation_message(*.violation))]
pub struct WorkItemError {
    /// The key the item was being built for.
    pub key: Key,
    /// The violated rule.
    pub violation: WorkItemViolation,
}

fn violation_message(violation: WorkItemViolation) -> &'static str {
    match violation {
        WorkItemViolation::EmptyPayload => "neither a timer firing nor elements were supplied",
        WorkItemViolation::AmbiguousPayload => {
            "a timer firing and elements cannot be delivered in the same work item"
        }
        WorkItemViolation::KeyMismatch => "timer key does not match the work item key",
    }
}

impl WorkItemError {
    /// Creates a new work item error.
    #[must_use]
    pub fn new(key: Key, violation: WorkItemViolation) -> Self {
        Self { key, violation }
    }
}

/// Error raised when a timer timestamp does not belong to the declared domain.
#[derive(Debug, Clone, Error)]
#[error("Timer '{name}' declared in {declared} domain but given a {actual} timestamp")]
pub struct TimeDomainMismatchError {
    /// The timer name.
    pub name: String,
    /// The domain the timer was declared in.
    pub declared: TimeDomain,
    /// The domain of the supplied timestamp.
    pub actual: TimeDomain,
}

impl TimeDomainMismatchError {
    /// Creates a new mismatch error.
    #[must_use]
    pub fn new(name: impl Into<String>, declared: TimeDomain, actual: TimeDomain) -> Self {
        Self {
            name: name.into(),
            declared,
            actual,
        }
    }
}

/// Error raised on a second attempt to attach logical metrics to a result.
///
/// A second attachment means the same bundle result went through the
/// executor twice.
#[derive(Debug, Clone, Error)]
#[error("Logical metric updates already attached to result of '{transform}'")]
pub struct MetricsAlreadyAttachedError {
    /// The transform whose result was attached twice.
    pub transform: TransformId,
}

impl MetricsAlreadyAttachedError {
    /// Creates a new double-attachment error.
    #[must_use]
    pub fn new(transform: TransformId) -> Self {
        Self { transform }
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_error_message() {
        let err = WorkItemError::new(Key::from("k1"), WorkItemViolation::EmptyPayload);
        assert!(err.to_string().contains("k1"));
        assert!(err.to_string().contains("neither a timer firing nor elements"));
    }

    #[test]
    fn test_time_domain_mismatch_message() {
        let err = TimeDomainMismatchError::new(
            "expiry",
            TimeDomain::EventTime,
            TimeDomain::ProcessingTime,
        );
        let msg = err.to_string();
        assert!(msg.contains("expiry"));
        assert!(msg.contains("event_time"));
        assert!(msg.contains("processing_time"));
    }

    #[test]
    fn test_engine_error_fatality() {
        let fatal: EngineError =
            MetricsAlreadyAttachedError::new(TransformId::from("ParDo(Count)")).into();
        assert!(fatal.is_fatal());

        let not_fatal = EngineError::evaluation(
            TransformId::from("ParDo(Count)"),
            Key::from("k1"),
            "boom",
        );
        assert!(!not_fatal.is_fatal());
    }

    #[test]
    fn test_engine_error_to_dict() {
        let err = EngineError::UnknownTransform(TransformId::from("Missing"));
        let dict = err.to_dict();
        assert_eq!(dict.get("type").unwrap(), "UnknownTransform");
        assert_eq!(dict.get("fatal").unwrap(), false);
    }
}

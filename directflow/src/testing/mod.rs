//! Testing utilities for engine users.
//!
//! This module provides:
//! - Fixtures for transforms, elements and timers
//! - An engine harness with a collecting event sink
//! - Closure-backed evaluators that record their deliveries

mod fixtures;
mod mocks;

pub use fixtures::{event_timer, kv, processing_timer, transform, value, value_at, EngineFixture};
pub use mocks::{Delivery, FnEvaluatorFactory};

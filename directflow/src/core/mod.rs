//! Core contract types of the engine.
//!
//! This module contains the values exchanged between evaluators, the timer
//! subsystem and the scheduler:
//! - Timer identities, scheduled timers and timer firings
//! - Keyed work items (a fired timer or a run of elements)
//! - Transform results and their write-once metrics slot
//! - Timer and element lifecycle states

mod result;
mod status;
mod timer;
mod work_item;
#[cfg(test)]
mod work_item_tests;

pub use result::{LogicalMetricsSlot, TransformResult, TransformResultParts, WatermarkHold};
pub use status::{ElementsState, TimerState};
pub use timer::{ScheduledTimer, TimeDomain, TimerFiring, TimerId, TimerTimestamp, TimerUpdate};
pub use work_item::{KeyedWorkItem, WorkPayload};

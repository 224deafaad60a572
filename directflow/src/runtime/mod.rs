//! Keyed scheduling and execution.
//!
//! - [`EvaluationEngine`] buffers elements, fires timers, drains keys and
//!   commits results
//! - [`TransformExecutor`] runs one work item and attaches its metrics
//! - [`TransformEvaluator`] and [`EvaluatorFactory`] are implemented by
//!   transforms

mod buffer;
mod engine;
mod evaluator;
mod executor;
mod shard;

pub use buffer::ElementBuffer;
pub use engine::{CommittedResult, EvaluationEngine, RunSummary};
pub use evaluator::{EvaluationContext, EvaluatorFactory, TransformEvaluator};
pub use executor::{ExecutedWorkItem, TransformExecutor, ELEMENTS_PER_WORK_ITEM};
pub use shard::{KeyShard, ShardRegistry, ShardState};

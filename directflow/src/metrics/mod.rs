//! Counter deltas and logical metric updates.

mod counters;
mod updates;

pub use counters::CounterDeltas;
pub use updates::{DistributionData, MetricUpdates, MetricsAggregator};

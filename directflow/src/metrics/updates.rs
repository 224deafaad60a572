//! Logical metric updates and their per-transform aggregation.

use super::CounterDeltas;
use crate::model::TransformId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary statistics of a distribution metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionData {
    /// Sum of all observed values.
    pub sum: i64,
    /// Number of observed values.
    pub count: u64,
    /// Smallest observed value.
    pub min: i64,
    /// Largest observed value.
    pub max: i64,
}

impl DistributionData {
    /// Creates a distribution from a single observation.
    #[must_use]
    pub const fn singleton(value: i64) -> Self {
        Self {
            sum: value,
            count: 1,
            min: value,
            max: value,
        }
    }

    /// Combines two distributions.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            sum: self.sum.saturating_add(other.sum),
            count: self.count.saturating_add(other.count),
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the mean, or `None` if nothing was observed.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Metric updates produced by one evaluation, attached to its result by the
/// executor after the evaluator returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricUpdates {
    /// Counter deltas.
    #[serde(default)]
    pub counters: CounterDeltas,
    /// Distribution updates by metric name.
    #[serde(default)]
    pub distributions: HashMap<String, DistributionData>,
}

impl MetricUpdates {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an update carrying only counters.
    #[must_use]
    pub fn from_counters(counters: CounterDeltas) -> Self {
        Self {
            counters,
            distributions: HashMap::new(),
        }
    }

    /// Records one observation of a distribution.
    pub fn observe(&mut self, name: impl Into<String>, value: i64) {
        let observation = DistributionData::singleton(value);
        self.distributions
            .entry(name.into())
            .and_modify(|existing| *existing = existing.combine(observation))
            .or_insert(observation);
    }

    /// Merges another update into this one.
    pub fn merge(&mut self, other: &Self) {
        self.counters.merge(&other.counters);
        for (name, data) in &other.distributions {
            self.distributions
                .entry(name.clone())
                .and_modify(|existing| *existing = existing.combine(*data))
                .or_insert(*data);
        }
    }

    /// Returns true if the update carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.distributions.is_empty()
    }
}

/// Committed logical metrics per transform.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    committed: RwLock<HashMap<TransformId, MetricUpdates>>,
}

impl MetricsAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits the updates of one result.
    pub fn commit(&self, transform: &TransformId, updates: &MetricUpdates) {
        if updates.is_empty() {
            return;
        }
        self.committed
            .write()
            .entry(transform.clone())
            .or_default()
            .merge(updates);
    }

    /// Returns the committed metrics of a transform.
    #[must_use]
    pub fn committed(&self, transform: &TransformId) -> MetricUpdates {
        self.committed
            .read()
            .get(transform)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the committed value of a counter, summed over every transform.
    #[must_use]
    pub fn counter_total(&self, name: &str) -> i64 {
        self.committed
            .read()
            .values()
            .filter_map(|updates| updates.counters.get(name))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_combine() {
        let combined = DistributionData::singleton(3).combine(DistributionData::singleton(7));
        assert_eq!(combined.count, 2);
        assert_eq!(combined.min, 3);
        assert_eq!(combined.max, 7);
        assert_eq!(combined.mean(), Some(5.0));
    }

    #[test]
    fn test_observe_and_merge() {
        let mut a = MetricUpdates::new();
        a.observe("latency", 10);
        let mut b = MetricUpdates::from_counters(CounterDeltas::new().with("n", 1));
        b.observe("latency", 30);

        a.merge(&b);
        let latency = a.distributions["latency"];
        assert_eq!(latency.sum, 40);
        assert_eq!(a.counters.get("n"), Some(1));
    }

    #[test]
    fn test_aggregator_commits_per_transform() {
        let aggregator = MetricsAggregator::new();
        let a = TransformId::from("A");
        let b = TransformId::from("B");
        let updates = MetricUpdates::from_counters(CounterDeltas::new().with("n", 2));

        aggregator.commit(&a, &updates);
        aggregator.commit(&a, &updates);
        aggregator.commit(&b, &updates);

        assert_eq!(aggregator.committed(&a).counters.get("n"), Some(4));
        assert_eq!(aggregator.counter_total("n"), 6);
        assert!(aggregator.committed(&TransformId::from("C")).is_empty());
    }
}

//! Counter deltas reported by one evaluation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A mapping from counter name to the delta produced by one evaluation.
///
/// Merging is per-name addition, so deltas from concurrent evaluations can be
/// combined in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterDeltas(HashMap<String, i64>);

impl CounterDeltas {
    /// Creates an empty set of deltas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the named counter.
    pub fn inc(&mut self, name: impl Into<String>, delta: i64) {
        let entry = self.0.entry(name.into()).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    /// Adds a delta, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, delta: i64) -> Self {
        self.inc(name, delta);
        self
    }

    /// Merges another set of deltas into this one.
    pub fn merge(&mut self, other: &Self) {
        for (name, delta) in &other.0 {
            self.inc(name.clone(), *delta);
        }
    }

    /// Returns the delta for a counter, if any was recorded.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    /// Returns the number of counters with a recorded delta.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no deltas were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, delta)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, delta)| (name.as_str(), *delta))
    }
}

impl FromIterator<(String, i64)> for CounterDeltas {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut deltas = Self::new();
        for (name, delta) in iter {
            deltas.inc(name, delta);
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inc_accumulates() {
        let mut deltas = CounterDeltas::new();
        deltas.inc("elements", 2);
        deltas.inc("elements", 3);
        assert_eq!(deltas.get("elements"), Some(5));
        assert_eq!(deltas.get("missing"), None);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = CounterDeltas::new().with("x", 1).with("y", 10);
        let b = CounterDeltas::new().with("x", 4).with("z", -2);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.get("x"), Some(5));
        assert_eq!(ab.len(), 3);
    }

    #[test]
    fn test_from_iter_sums_duplicates() {
        let deltas: CounterDeltas = vec![("a".to_string(), 1), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(deltas.get("a"), Some(2));
    }
}

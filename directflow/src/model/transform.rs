//! Applied transforms as seen by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of an applied transform, its full label in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformId(String);

impl TransformId {
    /// Creates a transform id.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransformId {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transform instance applied in the pipeline graph.
///
/// The graph outlives every evaluation, so results and bundles hold this
/// through an `Arc` instead of owning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransform {
    /// The transform's full label.
    pub id: TransformId,
    /// Collections consumed by the transform.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Collections produced by the transform.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl AppliedTransform {
    /// Creates an applied transform without inputs or outputs.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TransformId::new(id),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Adds an input collection.
    #[must_use]
    pub fn with_input(mut self, pcollection: impl Into<String>) -> Self {
        self.inputs.push(pcollection.into());
        self
    }

    /// Adds an output collection.
    #[must_use]
    pub fn with_output(mut self, pcollection: impl Into<String>) -> Self {
        self.outputs.push(pcollection.into());
        self
    }

    /// Wraps the transform for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns true if the transform consumes the given collection.
    #[must_use]
    pub fn consumes(&self, pcollection: &str) -> bool {
        self.inputs.iter().any(|input| input == pcollection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_transform_builder() {
        let transform = AppliedTransform::new("GroupByKey")
            .with_input("pc/words")
            .with_output("pc/grouped");

        assert_eq!(transform.id.as_str(), "GroupByKey");
        assert!(transform.consumes("pc/words"));
        assert!(!transform.consumes("pc/grouped"));
    }

    #[test]
    fn test_transform_id_display() {
        assert_eq!(TransformId::from("ParDo(Split)").to_string(), "ParDo(Split)");
    }
}

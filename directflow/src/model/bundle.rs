//! Uncommitted and committed bundles.

use super::{Key, ProcessingTime, WindowedValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bundle under construction by an evaluator.
///
/// Owned exclusively by the evaluation that produced it until the commitment
/// step turns it into a [`CommittedBundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncommittedBundle {
    pcollection: String,
    key: Option<Key>,
    elements: Vec<WindowedValue>,
}

impl UncommittedBundle {
    /// Creates an empty, unkeyed bundle for a collection.
    #[must_use]
    pub fn new(pcollection: impl Into<String>) -> Self {
        Self {
            pcollection: pcollection.into(),
            key: None,
            elements: Vec::new(),
        }
    }

    /// Creates an empty bundle for a single key.
    #[must_use]
    pub fn keyed(pcollection: impl Into<String>, key: Key) -> Self {
        Self {
            pcollection: pcollection.into(),
            key: Some(key),
            elements: Vec::new(),
        }
    }

    /// Appends an element.
    pub fn add(&mut self, element: WindowedValue) {
        self.elements.push(element);
    }

    /// Appends an element, builder style.
    #[must_use]
    pub fn with_element(mut self, element: WindowedValue) -> Self {
        self.elements.push(element);
        self
    }

    /// Appends several elements, builder style.
    #[must_use]
    pub fn with_elements(mut self, elements: impl IntoIterator<Item = WindowedValue>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Returns the target collection.
    #[must_use]
    pub fn pcollection(&self) -> &str {
        &self.pcollection
    }

    /// Returns the key, if the bundle is keyed.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the buffered elements.
    #[must_use]
    pub fn elements(&self) -> &[WindowedValue] {
        &self.elements
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the bundle has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A bundle that has been given a stable identity and made visible to its
/// consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedBundle {
    /// Stable bundle identity.
    pub id: Uuid,
    /// The collection the bundle belongs to.
    pub pcollection: String,
    /// The key, if the bundle is keyed.
    pub key: Option<Key>,
    /// The committed elements.
    pub elements: Vec<WindowedValue>,
    /// Processing time at which the bundle was committed.
    pub synchronized_processing_time: ProcessingTime,
}

impl CommittedBundle {
    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the bundle has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Creates and commits bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleFactory;

impl BundleFactory {
    /// Creates a new bundle factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Commits a bundle, assigning it a fresh identity.
    #[must_use]
    pub fn commit(&self, bundle: UncommittedBundle, at: ProcessingTime) -> CommittedBundle {
        CommittedBundle {
            id: Uuid::new_v4(),
            pcollection: bundle.pcollection,
            key: bundle.key,
            elements: bundle.elements,
            synchronized_processing_time: at,
        }
    }
}

//! Per-key element buffering.

use crate::core::KeyedWorkItem;
use crate::model::{Key, WindowedValue};
use std::collections::HashMap;

/// Accumulates elements per key and releases them as work items.
///
/// A key's buffer becomes a work item as soon as it reaches the bundle size;
/// [`flush`](Self::flush) releases the rest in first-arrival order.
#[derive(Debug)]
pub struct ElementBuffer {
    max_bundle_size: usize,
    buffers: HashMap<Key, Vec<WindowedValue>>,
    arrival: Vec<Key>,
}

impl ElementBuffer {
    /// Creates a buffer. A bundle size of zero is treated as one.
    #[must_use]
    pub fn new(max_bundle_size: usize) -> Self {
        Self {
            max_bundle_size: max_bundle_size.max(1),
            buffers: HashMap::new(),
            arrival: Vec::new(),
        }
    }

    /// Buffers elements for a key, returning every work item that became
    /// ready.
    pub fn extend(
        &mut self,
        key: &Key,
        elements: impl IntoIterator<Item = WindowedValue>,
    ) -> Vec<KeyedWorkItem> {
        let mut ready = Vec::new();
        for element in elements {
            if let Some(item) = self.push(key, element) {
                ready.push(item);
            }
        }
        ready
    }

    /// Buffers one element, returning a work item if the key's buffer is full.
    pub fn push(&mut self, key: &Key, element: WindowedValue) -> Option<KeyedWorkItem> {
        let buffer = self.buffers.entry(key.clone()).or_insert_with(|| {
            self.arrival.push(key.clone());
            Vec::new()
        });
        buffer.push(element);
        if buffer.len() < self.max_bundle_size {
            return None;
        }
        let elements = self.take(key);
        KeyedWorkItem::for_elements(key.clone(), elements).ok()
    }

    /// Releases every non-empty buffer as a work item.
    pub fn flush(&mut self) -> Vec<KeyedWorkItem> {
        let keys = std::mem::take(&mut self.arrival);
        keys.into_iter()
            .filter_map(|key| {
                let elements = self.buffers.remove(&key)?;
                KeyedWorkItem::for_elements(key, elements).ok()
            })
            .collect()
    }

    fn take(&mut self, key: &Key) -> Vec<WindowedValue> {
        self.arrival.retain(|k| k != key);
        self.buffers.remove(key).unwrap_or_default()
    }

    /// Returns the number of buffered elements across keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

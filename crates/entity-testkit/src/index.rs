//! In-memory indexed-attribute store with failure injection.

use entity_core::effects::AttributeIndex;
use entity_core::HostError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct IndexInner {
    current: HashMap<&'static str, Vec<String>>,
    publish_counts: HashMap<&'static str, usize>,
    failing: bool,
}

/// Records every publish so tests can assert on projection freshness.
#[derive(Clone, Debug, Default)]
pub struct RecordingIndex {
    inner: Arc<Mutex<IndexInner>>,
}

impl RecordingIndex {
    /// Latest published value set for `key` (empty if never published).
    pub fn published(&self, key: &'static str) -> Vec<String> {
        self.inner.lock().current.get(key).cloned().unwrap_or_default()
    }

    /// How many publishes have been attempted for `key`, failed ones
    /// included.
    pub fn publish_count(&self, key: &'static str) -> usize {
        self.inner.lock().publish_counts.get(key).copied().unwrap_or(0)
    }

    /// Make every subsequent publish fail (or succeed again).
    pub fn fail_publishes(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }
}

impl AttributeIndex for RecordingIndex {
    fn publish(&self, key: &'static str, values: Vec<String>) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        *inner.publish_counts.entry(key).or_default() += 1;
        if inner.failing {
            return Err(HostError::index_unavailable("index publish rejected by test"));
        }
        inner.current.insert(key, values);
        Ok(())
    }
}

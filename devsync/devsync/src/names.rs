//! Path to contract name cache.

use std::collections::HashMap;

/// Contract names resolved so far, keyed by source location.
///
/// Entries are never invalidated: a file is assumed to keep declaring the
/// same contract for as long as it keeps its path. Removal events rely on
/// this, since the source is gone by the time they arrive.
#[derive(Debug, Clone, Default)]
pub struct ContractNames {
    names: HashMap<String, String>,
}

impl ContractNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location: &str) -> Option<&str> {
        self.names.get(location).map(String::as_str)
    }

    pub fn insert(&mut self, location: impl Into<String>, name: impl Into<String>) {
        self.names.insert(location.into(), name.into());
    }

    /// Forget every cached name.
    pub fn reset(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

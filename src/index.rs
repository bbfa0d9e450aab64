use crate::models::SnapshotEntry;
use std::collections::BTreeMap;

/// Keyed view over one snapshot. Ordered by (model, provider) so every
/// downstream iteration is deterministic.
#[derive(Debug, Default)]
pub struct SnapshotIndex {
    entries: BTreeMap<(String, String), SnapshotEntry>,
}

impl SnapshotIndex {
    /// Last occurrence wins when a (model, provider) pair repeats in the input.
    pub fn build(entries: &[SnapshotEntry]) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert((entry.model.clone(), entry.provider.clone()), entry.clone());
        }
        Self { entries: map }
    }

    pub fn get(&self, model: &str, provider: &str) -> Option<&SnapshotEntry> {
        self.entries.get(&(model.to_string(), provider.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &SnapshotEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

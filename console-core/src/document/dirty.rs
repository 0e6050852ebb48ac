//! Dirty-field tracking

use serde_json::Value;
use std::collections::BTreeMap;

use super::path::PathAddress;

/// One unsaved edit
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyEntry {
    pub path: PathAddress,
    pub value: Value,
}

/// Last-write-wins map from path to the latest value written.
///
/// Keyed by the segments themselves, since two paths can share a dot-joined
/// form when a segment contains a dot. Entries are ordered by path, so
/// consumers see a stable order. The order has no meaning beyond that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtyFieldTracker {
    entries: BTreeMap<PathAddress, DirtyEntry>,
}

impl DirtyFieldTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathAddress, value: Value) {
        self.entries.insert(path.clone(), DirtyEntry { path, value });
    }

    pub fn remove(&mut self, path: &PathAddress) -> Option<DirtyEntry> {
        self.entries.remove(path)
    }

    /// Drop every entry that lies strictly underneath `ancestor`.
    pub fn remove_descendants(&mut self, ancestor: &PathAddress) {
        self.entries
            .retain(|_, entry| !entry.path.is_strict_descendant_of(ancestor));
    }

    /// Closest recorded entry that `path` lies strictly underneath.
    pub fn ancestor_of(&self, path: &PathAddress) -> Option<&DirtyEntry> {
        self.entries
            .values()
            .filter(|entry| path.is_strict_descendant_of(&entry.path))
            .max_by_key(|entry| entry.path.len())
    }

    pub fn get(&self, path: &PathAddress) -> Option<&DirtyEntry> {
        self.entries.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirtyEntry> {
        self.entries.values()
    }

    /// Dot-joined keys, for display and logging.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.keys().map(PathAddress::key)
    }
}

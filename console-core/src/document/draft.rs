//! Draft document with its original snapshot and dirty set

use serde_json::Value;

use super::dirty::{DirtyEntry, DirtyFieldTracker};
use super::mutate::{DocumentMutator, MutateError};
use super::path::PathAddress;
use super::schema::FieldSchema;

/// Live draft, the snapshot it was loaded from, and the edits between them.
///
/// The dirty set is the only source of the modified state. An edit that
/// writes back the snapshot's value removes its entry. Edits below an already
/// recorded ancestor are folded into that ancestor's entry, so entries never
/// overlap.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    schema: FieldSchema,
    snapshot: Value,
    draft: Value,
    dirty: DirtyFieldTracker,
}

impl DocumentDraft {
    /// `document` must already be normalized for display.
    pub fn new(schema: FieldSchema, document: Value) -> Self {
        Self {
            schema,
            draft: document.clone(),
            snapshot: document,
            dirty: DirtyFieldTracker::new(),
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    pub fn current(&self) -> &Value {
        &self.draft
    }

    pub fn dirty(&self) -> &DirtyFieldTracker {
        &self.dirty
    }

    pub fn is_modified(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn value_at(&self, path: &PathAddress) -> Option<&Value> {
        DocumentMutator::new(&self.schema).get(&self.draft, path)
    }

    pub fn edit(&mut self, path: PathAddress, value: Value) -> Result<(), MutateError> {
        let mutator = DocumentMutator::new(&self.schema);
        mutator.apply(&mut self.draft, &path, value)?;
        self.track(path);
        Ok(())
    }

    /// Throw away every edit.
    pub fn cancel(&mut self) {
        self.draft = self.snapshot.clone();
        self.dirty.clear();
    }

    /// Forget entries that were submitted and not edited again since.
    pub fn acknowledge(&mut self, submitted: &[DirtyEntry]) {
        for entry in submitted {
            if self.dirty.get(&entry.path) == Some(entry) {
                self.dirty.remove(&entry.path);
            }
        }
    }

    /// Replace the snapshot with a fresh server document and replay the
    /// remaining edits on top of it.
    pub fn rebase(&mut self, document: Value) {
        let pending: Vec<DirtyEntry> = self.dirty.entries().cloned().collect();
        self.snapshot = document.clone();
        self.draft = document;
        self.dirty.clear();

        for entry in pending {
            let applied = DocumentMutator::new(&self.schema).apply(&mut self.draft, &entry.path, entry.value);
            match applied {
                Ok(()) => self.track(entry.path),
                Err(err) => tracing::warn!(
                    path = %entry.path,
                    error = %err,
                    "Dropping pending edit that no longer applies"
                ),
            }
        }
    }

    fn track(&mut self, path: PathAddress) {
        let mutator = DocumentMutator::new(&self.schema);
        let ancestor = self.dirty.ancestor_of(&path).map(|entry| entry.path.clone());
        let tracked = match ancestor {
            Some(ancestor) => ancestor,
            None => {
                self.dirty.remove_descendants(&path);
                path
            }
        };

        let current = mutator.get(&self.draft, &tracked).cloned();
        let original = mutator.get(&self.snapshot, &tracked);
        match current {
            Some(value) if original != Some(&value) => self.dirty.record(tracked, value),
            _ => {
                self.dirty.remove(&tracked);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> PathAddress {
        PathAddress::new(segments.iter().copied()).unwrap()
    }

    fn draft() -> DocumentDraft {
        DocumentDraft::new(
            FieldSchema::prompt_document(),
            json!({
                "title": "Flirting",
                "personaPrompts": {
                    "maleConfident": {
                        "_id": "507f1f77bcf86cd799439011",
                        "title": "Confident Guy",
                        "languages": { "English": "old text" }
                    }
                },
                "scenarios": [
                    { "_id": "611f1f77bcf86cd7994390a1", "title": "Coffee shop", "promptAddOn": "old" }
                ]
            }),
        )
    }

    fn assert_consistent(draft: &DocumentDraft) {
        assert_eq!(draft.is_modified(), draft.current() != draft.snapshot());
    }

    #[test]
    fn test_modified_state_toggles_on_revert() {
        let mut draft = draft();
        assert!(!draft.is_modified());

        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        assert!(draft.is_modified());
        assert_consistent(&draft);

        draft.edit(path(&["title"]), json!("Flirting")).unwrap();
        assert!(!draft.is_modified());
        assert_consistent(&draft);
    }

    #[test]
    fn test_partial_revert_keeps_modified() {
        let mut draft = draft();
        let en = path(&["personaPrompts", "maleConfident", "languages", "English"]);
        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        draft.edit(en.clone(), json!("new text")).unwrap();
        draft.edit(path(&["title"]), json!("Flirting")).unwrap();

        assert!(draft.is_modified());
        assert_eq!(draft.dirty().len(), 1);
        assert!(draft.dirty().get(&en).is_some());
        assert_consistent(&draft);
    }

    #[test]
    fn test_snapshot_is_never_mutated() {
        let mut draft = draft();
        let before = draft.snapshot().clone();
        draft
            .edit(
                path(&["scenarios", "611f1f77bcf86cd7994390a1", "promptAddOn"]),
                json!("new"),
            )
            .unwrap();
        assert_eq!(draft.snapshot(), &before);
        assert_eq!(draft.current()["scenarios"][0]["promptAddOn"], "new");
    }

    #[test]
    fn test_failed_edit_records_nothing() {
        let mut draft = draft();
        let result = draft.edit(
            path(&["scenarios", "bbbbbbbbbbbbbbbbbbbbbbbb", "title"]),
            json!("ghost"),
        );
        assert!(result.is_err());
        assert!(!draft.is_modified());
        assert_eq!(draft.current(), draft.snapshot());
    }

    #[test]
    fn test_leaf_edit_under_replaced_entry_folds_into_ancestor() {
        let mut draft = draft();
        let entry = path(&["personaPrompts", "maleConfident"]);
        draft
            .edit(
                entry.clone(),
                json!({ "_id": "507f1f77bcf86cd799439011", "title": "Replaced" }),
            )
            .unwrap();
        draft
            .edit(path(&["personaPrompts", "maleConfident", "role"]), json!("lead"))
            .unwrap();

        assert_eq!(draft.dirty().len(), 1);
        let recorded = draft.dirty().get(&entry).unwrap();
        assert_eq!(recorded.value["role"], "lead");
        assert_eq!(recorded.value["title"], "Replaced");
    }

    #[test]
    fn test_ancestor_edit_absorbs_descendants() {
        let mut draft = draft();
        draft
            .edit(path(&["personaPrompts", "maleConfident", "title"]), json!("Bold Guy"))
            .unwrap();
        draft
            .edit(
                path(&["personaPrompts", "maleConfident"]),
                json!({ "_id": "507f1f77bcf86cd799439011", "title": "Other" }),
            )
            .unwrap();
        let keys: Vec<String> = draft.dirty().keys().collect();
        assert_eq!(keys, vec!["personaPrompts.maleConfident"]);
    }

    #[test]
    fn test_dotted_segment_edits_are_tracked_separately() {
        let mut draft = draft();
        draft
            .edit(path(&["personaPrompts", "a.b", "title"]), json!("dotted"))
            .unwrap();
        draft
            .edit(path(&["personaPrompts", "a", "b", "title"]), json!("nested"))
            .unwrap();

        assert_eq!(draft.dirty().len(), 2);
        assert_eq!(draft.current()["personaPrompts"]["a.b"]["title"], "dotted");
        assert_eq!(draft.current()["personaPrompts"]["a"]["b"]["title"], "nested");
        assert_consistent(&draft);

        draft.cancel();
        assert!(!draft.is_modified());
    }

    #[test]
    fn test_cancel_restores_snapshot() {
        let mut draft = draft();
        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        draft.cancel();
        assert!(!draft.is_modified());
        assert_eq!(draft.current()["title"], "Flirting");
    }

    #[test]
    fn test_acknowledge_keeps_edits_made_after_submission() {
        let mut draft = draft();
        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        draft
            .edit(path(&["personaPrompts", "maleConfident", "role"]), json!("lead"))
            .unwrap();
        let submitted: Vec<DirtyEntry> = draft.dirty().entries().cloned().collect();

        draft.edit(path(&["title"]), json!("Romance")).unwrap();
        draft.acknowledge(&submitted);

        let keys: Vec<String> = draft.dirty().keys().collect();
        assert_eq!(keys, vec!["title"]);
    }

    #[test]
    fn test_rebase_replays_pending_edits() {
        let mut draft = draft();
        draft.edit(path(&["title"]), json!("Romance")).unwrap();

        let mut server = draft.snapshot().clone();
        server["title"] = json!("Dating");
        server["personaPrompts"]["maleConfident"]["role"] = json!("lead");
        draft.rebase(server);

        assert_eq!(draft.snapshot()["title"], "Dating");
        assert_eq!(draft.current()["title"], "Romance");
        assert_eq!(draft.current()["personaPrompts"]["maleConfident"]["role"], "lead");
        assert!(draft.is_modified());
        assert_consistent(&draft);
    }

    #[test]
    fn test_rebase_drops_edits_matching_new_snapshot() {
        let mut draft = draft();
        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        let mut server = draft.snapshot().clone();
        server["title"] = json!("Dating");
        draft.rebase(server);
        assert!(!draft.is_modified());
    }
}

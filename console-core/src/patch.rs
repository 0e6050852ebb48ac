//! Minimal partial-update payloads
//!
//! Dirty entries are partitioned by path class. Top-level entries are written
//! into the payload root at their full path. Dictionary and collection
//! entries are grouped per field and per key/id into `{ id, updates }`
//! objects, where `updates` holds only the changed leaves at their paths
//! relative to the entry. Dictionary keys are resolved to the entry's real
//! identifier through the original snapshot.

use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::{PatchGroup, SERVER_MANAGED_FIELDS};
use std::collections::BTreeMap;

use crate::codes::CodeNormalizer;
use crate::document::{write_nested, DirtyEntry, FieldSchema, PathClass};

/// Body of `PATCH <config-endpoint>/<id>`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatchPayload(Map<String, Value>);

impl PatchPayload {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

type Groups = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, Copy)]
pub struct PatchPayloadBuilder<'a> {
    schema: &'a FieldSchema,
    normalizer: &'a CodeNormalizer,
}

impl<'a> PatchPayloadBuilder<'a> {
    pub fn new(schema: &'a FieldSchema, normalizer: &'a CodeNormalizer) -> Self {
        Self { schema, normalizer }
    }

    pub fn build<'e, I>(&self, entries: I, original: &Value, current: &Value) -> PatchPayload
    where
        I: IntoIterator<Item = &'e DirtyEntry>,
    {
        let mut root = Value::Object(Map::new());
        let mut dictionaries: Groups = BTreeMap::new();
        let mut collections: Groups = BTreeMap::new();

        for entry in entries {
            match self.schema.classify(&entry.path, current) {
                PathClass::TopLevel => {
                    write_nested(&mut root, entry.path.segments(), entry.value.clone());
                }
                PathClass::DictionaryEntry { field, key, rest } => {
                    let updates = group_slot(&mut dictionaries, field, key);
                    merge_update(updates, rest, &entry.value);
                }
                PathClass::CollectionEntry { field, id, rest } => {
                    let updates = group_slot(&mut collections, field, id);
                    merge_update(updates, rest, &entry.value);
                }
            }
        }

        let Value::Object(mut root) = root else {
            return PatchPayload::default();
        };

        for (field, groups) in dictionaries {
            let items: Vec<PatchGroup> = groups
                .into_iter()
                .filter_map(|(key, updates)| {
                    let id = self.resolve_dictionary_id(&field, &key, original, current);
                    into_group(id, updates)
                })
                .collect();
            insert_groups(&mut root, field, items);
        }

        for (field, groups) in collections {
            let items: Vec<PatchGroup> = groups
                .into_iter()
                .filter_map(|(id, updates)| into_group(id, updates))
                .collect();
            insert_groups(&mut root, field, items);
        }

        if strip_server_managed(&mut root) {
            tracing::debug!("Stripped server-managed fields from patch root");
        }

        match self.normalizer.to_wire(&Value::Object(root)) {
            Value::Object(map) => PatchPayload(map),
            _ => PatchPayload::default(),
        }
    }

    /// Snapshot first, then the live draft, then the key itself.
    fn resolve_dictionary_id(&self, field: &str, key: &str, original: &Value, current: &Value) -> String {
        let lookup = |document: &Value| {
            document
                .get(field)
                .and_then(|dictionary| dictionary.get(key))
                .and_then(|entry| entry.get(self.schema.id_field()))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        lookup(original).or_else(|| lookup(current)).unwrap_or_else(|| {
            tracing::warn!(field, key, "No identifier found for dictionary entry; sending key");
            key.to_string()
        })
    }
}

/// Returns true when anything was removed.
fn strip_server_managed(fields: &mut Map<String, Value>) -> bool {
    SERVER_MANAGED_FIELDS
        .iter()
        .fold(false, |removed, field| fields.remove(*field).is_some() || removed)
}

/// The entry's identifier travels in `id`, so server-owned fields are
/// dropped from `updates`. A group left with nothing to update is skipped.
fn into_group(id: String, mut updates: Value) -> Option<PatchGroup> {
    if let Value::Object(fields) = &mut updates {
        strip_server_managed(fields);
        if fields.is_empty() {
            tracing::debug!(id = %id, "Skipping patch group with only server-managed fields");
            return None;
        }
    }
    Some(PatchGroup { id, updates })
}

fn insert_groups(root: &mut Map<String, Value>, field: String, groups: Vec<PatchGroup>) {
    if groups.is_empty() {
        return;
    }
    match serde_json::to_value(&groups) {
        Ok(items) => {
            root.insert(field, items);
        }
        Err(err) => {
            tracing::warn!(field = %field, error = %err, "Failed to serialize patch groups");
        }
    }
}

fn group_slot<'g>(groups: &'g mut Groups, field: &str, key: &str) -> &'g mut Value {
    groups
        .entry(field.to_string())
        .or_default()
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
}

/// An empty relative path means the whole entry was replaced; its fields
/// become the updates.
fn merge_update(updates: &mut Value, rest: &[String], value: &Value) {
    if !rest.is_empty() {
        write_nested(updates, rest, value.clone());
        return;
    }
    match (updates, value) {
        (Value::Object(target), Value::Object(fields)) => {
            for (key, field_value) in fields {
                target.insert(key.clone(), field_value.clone());
            }
        }
        (slot, other) => *slot = other.clone(),
    }
}

/// Number of non-container values in a tree, not counting group ids.
pub fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| match (key.as_str(), child) {
                ("id", Value::String(_)) if map.contains_key("updates") => 0,
                _ => count_leaves(child),
            })
            .sum(),
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentDraft, PathAddress};
    use serde_json::json;

    fn path(segments: &[&str]) -> PathAddress {
        PathAddress::new(segments.iter().copied()).unwrap()
    }

    fn build(draft: &DocumentDraft) -> PatchPayload {
        let normalizer = CodeNormalizer::standard();
        PatchPayloadBuilder::new(draft.schema(), &normalizer).build(
            draft.dirty().entries(),
            draft.snapshot(),
            draft.current(),
        )
    }

    fn large_document() -> Value {
        let mut personas = Map::new();
        for i in 0..20 {
            personas.insert(
                format!("persona{i}"),
                json!({
                    "_id": format!("{:024x}", i + 1),
                    "title": format!("Persona {i}"),
                    "role": "role text",
                    "languages": { "English": "a", "Arabic": "b" },
                    "dialects": { "Egyptian": "c" },
                    "styles": { "romantic": "d" }
                }),
            );
        }
        let scenarios: Vec<Value> = (0..10)
            .map(|i| json!({ "_id": format!("{:024x}", 100 + i), "title": "t", "promptAddOn": "p" }))
            .collect();
        json!({
            "_id": "aaaaaaaaaaaaaaaaaaaaaaaa",
            "key": "flirting",
            "title": "Flirting",
            "personaPrompts": personas,
            "scenarios": scenarios
        })
    }

    #[test]
    fn test_single_edit_yields_single_leaf() {
        let paths = [
            path(&["title"]),
            path(&["personaPrompts", "persona7", "styles", "romantic"]),
            path(&["scenarios", format!("{:024x}", 104).as_str(), "promptAddOn"]),
        ];
        for edited in paths {
            let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
            draft.edit(edited.clone(), json!("changed")).unwrap();
            let payload = build(&draft);
            assert_eq!(count_leaves(&payload.clone().into_value()), 1, "{edited}");
        }
    }

    #[test]
    fn test_dictionary_key_resolves_to_document_id() {
        let doc = json!({
            "personaPrompts": {
                "maleConfident": { "_id": "507f1f77bcf86cd799439011", "title": "Confident Guy" }
            }
        });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), doc);
        draft
            .edit(path(&["personaPrompts", "maleConfident", "title"]), json!("Bold Guy"))
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                { "id": "507f1f77bcf86cd799439011", "updates": { "title": "Bold Guy" } }
            ]))
        );
    }

    #[test]
    fn test_dictionary_id_falls_back_to_draft_then_key() {
        let schema = FieldSchema::prompt_document();
        let normalizer = CodeNormalizer::standard();
        let builder = PatchPayloadBuilder::new(&schema, &normalizer);
        let entries = vec![
            DirtyEntry {
                path: path(&["personaPrompts", "fresh", "title"]),
                value: json!("New"),
            },
            DirtyEntry {
                path: path(&["personaPrompts", "orphan", "title"]),
                value: json!("Lost"),
            },
        ];
        let current = json!({
            "personaPrompts": {
                "fresh": { "_id": "cccccccccccccccccccccccc", "title": "New" },
                "orphan": { "title": "Lost" }
            }
        });
        let payload = builder.build(&entries, &json!({}), &current);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                { "id": "cccccccccccccccccccccccc", "updates": { "title": "New" } },
                { "id": "orphan", "updates": { "title": "Lost" } }
            ]))
        );
    }

    #[test]
    fn test_collection_id_passes_through() {
        let doc = json!({
            "scenarios": [
                { "_id": "611f1f77bcf86cd7994390a1", "title": "Coffee shop", "promptAddOn": "old" }
            ]
        });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), doc);
        draft
            .edit(
                path(&["scenarios", "611f1f77bcf86cd7994390a1", "promptAddOn"]),
                json!("ask about the latte art"),
            )
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("scenarios"),
            Some(&json!([
                {
                    "id": "611f1f77bcf86cd7994390a1",
                    "updates": { "promptAddOn": "ask about the latte art" }
                }
            ]))
        );
    }

    #[test]
    fn test_end_to_end_persona_language_edit() {
        let normalizer = CodeNormalizer::standard();
        let fetched = json!({
            "personaPrompts": {
                "maleConfident": { "_id": "A1", "title": "Confident Guy", "languages": { "en": "old text" } }
            }
        });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), normalizer.to_display(&fetched));
        draft
            .edit(
                path(&["personaPrompts", "maleConfident", "languages", "English"]),
                json!("new text"),
            )
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.into_value(),
            json!({
                "personaPrompts": [ { "id": "A1", "updates": { "languages": { "en": "new text" } } } ]
            })
        );
    }

    #[test]
    fn test_server_managed_fields_are_stripped() {
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        for field in ["_id", "key", "createdAt", "updatedAt"] {
            draft.edit(path(&[field]), json!("tampered")).unwrap();
        }
        draft.edit(path(&["title"]), json!("Dating")).unwrap();
        let payload = build(&draft);
        for field in SERVER_MANAGED_FIELDS {
            assert!(payload.get(field).is_none(), "{field} leaked");
        }
        assert_eq!(payload.get("title"), Some(&json!("Dating")));
    }

    #[test]
    fn test_groups_merge_multiple_leaves_per_entry() {
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        draft
            .edit(path(&["personaPrompts", "persona3", "title"]), json!("T"))
            .unwrap();
        draft
            .edit(path(&["personaPrompts", "persona3", "dialects", "Egyptian"]), json!("E"))
            .unwrap();
        draft
            .edit(path(&["personaPrompts", "persona5", "role"]), json!("R"))
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                {
                    "id": format!("{:024x}", 4),
                    "updates": { "title": "T", "dialects": { "EGYPTIAN": "E" } }
                },
                { "id": format!("{:024x}", 6), "updates": { "role": "R" } }
            ]))
        );
    }

    #[test]
    fn test_whole_entry_replacement_becomes_updates() {
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        draft
            .edit(
                path(&["personaPrompts", "persona1"]),
                json!({ "title": "Fresh", "languages": { "Arabizi": "ahlan" } }),
            )
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                {
                    "id": format!("{:024x}", 2),
                    "updates": { "title": "Fresh", "languages": { "arbz": "ahlan" } }
                }
            ]))
        );
    }

    #[test]
    fn test_whole_collection_element_replacement_drops_server_fields() {
        let doc = json!({
            "scenarios": [
                { "_id": "611f1f77bcf86cd7994390a1", "title": "Coffee shop", "promptAddOn": "old" }
            ]
        });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), doc);
        draft
            .edit(
                path(&["scenarios", "611f1f77bcf86cd7994390a1"]),
                json!({
                    "_id": "611f1f77bcf86cd7994390a1",
                    "title": "Bookstore",
                    "promptAddOn": "old",
                    "updatedAt": "2024-01-01T00:00:00Z"
                }),
            )
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("scenarios"),
            Some(&json!([
                {
                    "id": "611f1f77bcf86cd7994390a1",
                    "updates": { "title": "Bookstore", "promptAddOn": "old" }
                }
            ]))
        );
    }

    #[test]
    fn test_whole_dictionary_entry_replacement_drops_id() {
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        draft
            .edit(
                path(&["personaPrompts", "persona1"]),
                json!({ "_id": format!("{:024x}", 2), "title": "Fresh" }),
            )
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                { "id": format!("{:024x}", 2), "updates": { "title": "Fresh" } }
            ]))
        );
    }

    #[test]
    fn test_group_with_only_server_fields_is_skipped() {
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        let scenario = format!("{:024x}", 101);
        draft
            .edit(path(&["scenarios", scenario.as_str(), "createdAt"]), json!("2024-01-01"))
            .unwrap();
        let payload = build(&draft);
        assert!(payload.get("scenarios").is_none());
        assert!(payload.is_empty());
    }

    #[test]
    fn test_nested_top_level_fields_keep_their_shape() {
        let doc = json!({ "optimized": { "languages": { "English": "x" } } });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), doc);
        draft
            .edit(path(&["optimized", "languages", "Arabic"]), json!("y"))
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.into_value(),
            json!({ "optimized": { "languages": { "ar": "y" } } })
        );
    }

    #[test]
    fn test_dotted_and_nested_keys_both_reach_payload() {
        let doc = json!({
            "personaPrompts": {
                "a.b": { "_id": "X1", "title": "t" },
                "a": { "_id": "X2", "b": { "title": "t" } }
            }
        });
        let mut draft = DocumentDraft::new(FieldSchema::prompt_document(), doc);
        draft
            .edit(path(&["personaPrompts", "a.b", "title"]), json!("dotted"))
            .unwrap();
        draft
            .edit(path(&["personaPrompts", "a", "b", "title"]), json!("nested"))
            .unwrap();
        let payload = build(&draft);
        assert_eq!(
            payload.get("personaPrompts"),
            Some(&json!([
                { "id": "X2", "updates": { "b": { "title": "nested" } } },
                { "id": "X1", "updates": { "title": "dotted" } }
            ]))
        );
    }

    #[test]
    fn test_clean_draft_builds_empty_payload() {
        let draft = DocumentDraft::new(FieldSchema::prompt_document(), large_document());
        assert!(build(&draft).is_empty());
    }
}

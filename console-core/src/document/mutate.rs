//! Leaf replacement inside a prompt document

use serde_json::{Map, Value};

use super::path::PathAddress;
use super::schema::{find_by_id, FieldSchema, PathClass};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutateError {
    /// No element of the collection carries the addressed identifier.
    /// Nothing is appended; the document is left unchanged.
    #[error("no entry with id {id} in collection {field}")]
    EntryNotFound { field: String, id: String },

    #[error("cannot descend into {path}: array index segment expected")]
    NotAContainer { path: String },
}

/// Writes values at path addresses, honoring the field schema for
/// collection entries.
#[derive(Debug, Clone, Copy)]
pub struct DocumentMutator<'s> {
    schema: &'s FieldSchema,
}

impl<'s> DocumentMutator<'s> {
    pub fn new(schema: &'s FieldSchema) -> Self {
        Self { schema }
    }

    /// Copy-on-write variant: returns the updated tree, `document` is untouched.
    pub fn mutate(
        &self,
        document: &Value,
        path: &PathAddress,
        value: Value,
    ) -> Result<Value, MutateError> {
        let mut next = document.clone();
        self.apply(&mut next, path, value)?;
        Ok(next)
    }

    /// In-place variant. On error the document is not modified.
    pub fn apply(
        &self,
        document: &mut Value,
        path: &PathAddress,
        value: Value,
    ) -> Result<(), MutateError> {
        match self.schema.classify(path, document) {
            PathClass::CollectionEntry { field, id, rest } => {
                let index = document
                    .get(field)
                    .and_then(Value::as_array)
                    .and_then(|items| find_by_id(items, self.schema.id_field(), id))
                    .ok_or_else(|| MutateError::EntryNotFound {
                        field: field.to_string(),
                        id: id.to_string(),
                    })?;
                let Some(element) = document
                    .get_mut(field)
                    .and_then(Value::as_array_mut)
                    .and_then(|items| items.get_mut(index))
                else {
                    return Err(MutateError::EntryNotFound {
                        field: field.to_string(),
                        id: id.to_string(),
                    });
                };
                if rest.is_empty() {
                    *element = value;
                    return Ok(());
                }
                check_descent(element, rest, path)?;
                set_nested(element, rest, value);
                Ok(())
            }
            PathClass::TopLevel | PathClass::DictionaryEntry { .. } => {
                check_descent(document, path.segments(), path)?;
                set_nested(document, path.segments(), value);
                Ok(())
            }
        }
    }

    /// Value currently stored at `path`, if any.
    pub fn get<'d>(&self, document: &'d Value, path: &PathAddress) -> Option<&'d Value> {
        match self.schema.classify(path, document) {
            PathClass::CollectionEntry { field, id, rest } => {
                let items = document.get(field)?.as_array()?;
                let element = &items[find_by_id(items, self.schema.id_field(), id)?];
                get_nested(element, rest)
            }
            PathClass::TopLevel | PathClass::DictionaryEntry { .. } => {
                get_nested(document, path.segments())
            }
        }
    }
}

fn get_nested<'d>(mut current: &'d Value, segments: &[String]) -> Option<&'d Value> {
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Read-only walk that fails exactly where `set_nested` would have to
/// overwrite an array. Runs before any write so errors leave no trace.
fn check_descent(
    mut current: &Value,
    segments: &[String],
    full: &PathAddress,
) -> Result<(), MutateError> {
    let Some((_, intermediate)) = segments.split_last() else {
        return Ok(());
    };
    for segment in intermediate.iter() {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => return Ok(()),
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(next) => next,
                None => {
                    return Err(MutateError::NotAContainer {
                        path: full.key(),
                    })
                }
            },
            _ => return Ok(()),
        };
    }
    if let Value::Array(items) = current {
        let last = &segments[segments.len() - 1];
        if last.parse::<usize>().ok().filter(|i| *i < items.len()).is_none() {
            return Err(MutateError::NotAContainer { path: full.key() });
        }
    }
    Ok(())
}

/// Write into a freshly built object tree (no arrays to guard against).
pub(crate) fn write_nested(target: &mut Value, segments: &[String], value: Value) {
    set_nested(target, segments, value);
}

/// Write `value` at `segments`, turning missing or scalar intermediates into
/// empty objects. Callers run `check_descent` first.
fn set_nested(current: &mut Value, segments: &[String], value: Value) {
    let Some((head, tail)) = segments.split_first() else {
        *current = value;
        return;
    };

    if let Value::Array(items) = current {
        if let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            set_nested(slot, tail, value);
        }
        return;
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        let slot = map.entry(head.clone()).or_insert(Value::Null);
        if tail.is_empty() {
            *slot = value;
        } else {
            set_nested(slot, tail, value);
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

    fn sample() -> Value {
        json!({
            "title": "Flirting",
            "personaPrompts": {
                "maleConfident": {
                    "_id": "507f1f77bcf86cd799439011",
                    "title": "Confident Guy",
                    "languages": { "en": "old text" }
                }
            },
            "scenarios": [
                { "_id": "611f1f77bcf86cd7994390a1", "title": "Coffee shop", "promptAddOn": "old" },
                { "_id": "611f1f77bcf86cd7994390a2", "title": "Gym", "promptAddOn": "lift" }
            ]
        })
    }

    #[test]
    fn test_replaces_top_level_scalar() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let doc = sample();
        let next = mutator.mutate(&doc, &path(&["title"]), json!("Dating")).unwrap();
        assert_eq!(next["title"], "Dating");
        assert_eq!(doc["title"], "Flirting");
    }

    #[test]
    fn test_replaces_dictionary_leaf() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let next = mutator
            .mutate(
                &sample(),
                &path(&["personaPrompts", "maleConfident", "languages", "en"]),
                json!("new text"),
            )
            .unwrap();
        assert_eq!(next["personaPrompts"]["maleConfident"]["languages"]["en"], "new text");
        assert_eq!(next["personaPrompts"]["maleConfident"]["title"], "Confident Guy");
    }

    #[test]
    fn test_dictionary_path_of_length_two_replaces_whole_entry() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let replacement = json!({ "_id": "507f1f77bcf86cd799439011", "title": "Replaced" });
        let next = mutator
            .mutate(&sample(), &path(&["personaPrompts", "maleConfident"]), replacement.clone())
            .unwrap();
        assert_eq!(next["personaPrompts"]["maleConfident"], replacement);
    }

    #[test]
    fn test_auto_vivifies_missing_containers() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let next = mutator
            .mutate(
                &sample(),
                &path(&["personaPrompts", "femalePlayful", "dialects", "EGYPTIAN"]),
                json!("ezayak"),
            )
            .unwrap();
        assert_eq!(next["personaPrompts"]["femalePlayful"]["dialects"]["EGYPTIAN"], "ezayak");
    }

    #[test]
    fn test_scalar_intermediate_becomes_object() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let next = mutator
            .mutate(&sample(), &path(&["title", "short"]), json!("F"))
            .unwrap();
        assert_eq!(next["title"], json!({ "short": "F" }));
    }

    #[test]
    fn test_replaces_collection_leaf_by_id() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let next = mutator
            .mutate(
                &sample(),
                &path(&["scenarios", "611f1f77bcf86cd7994390a2", "promptAddOn"]),
                json!("stretch"),
            )
            .unwrap();
        assert_eq!(next["scenarios"][1]["promptAddOn"], "stretch");
        assert_eq!(next["scenarios"][0]["promptAddOn"], "old");
    }

    #[test]
    fn test_replaces_whole_collection_element() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let element = json!({ "_id": "611f1f77bcf86cd7994390a1", "title": "Bookstore" });
        let next = mutator
            .mutate(&sample(), &path(&["scenarios", "611f1f77bcf86cd7994390a1"]), element.clone())
            .unwrap();
        assert_eq!(next["scenarios"][0], element);
        assert_eq!(next["scenarios"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_collection_entry_is_not_appended() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let mut doc = sample();
        let before = doc.clone();
        let err = mutator
            .apply(
                &mut doc,
                &path(&["scenarios", "aaaaaaaaaaaaaaaaaaaaaaaa", "promptAddOn"]),
                json!("ghost"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            MutateError::EntryNotFound {
                field: "scenarios".to_string(),
                id: "aaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_missing_collection_field_is_entry_not_found() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let mut doc = json!({ "title": "Empty" });
        let result = mutator.apply(
            &mut doc,
            &path(&["relationshipLevels", "611f1f77bcf86cd7994390a1", "title"]),
            json!("x"),
        );
        assert!(matches!(result, Err(MutateError::EntryNotFound { .. })));
        assert_eq!(doc, json!({ "title": "Empty" }));
    }

    #[test]
    fn test_non_index_segment_into_array_is_rejected_without_writes() {
        let schema = FieldSchema::empty().without_id_heuristic();
        let mutator = DocumentMutator::new(&schema);
        let mut doc = json!({ "list": ["a", "b"] });
        let result = mutator.apply(&mut doc, &path(&["list", "name"]), json!("c"));
        assert!(matches!(result, Err(MutateError::NotAContainer { .. })));
        assert_eq!(doc, json!({ "list": ["a", "b"] }));

        mutator.apply(&mut doc, &path(&["list", "1"]), json!("c")).unwrap();
        assert_eq!(doc, json!({ "list": ["a", "c"] }));
    }

    #[test]
    fn test_get_resolves_collection_entries() {
        let schema = FieldSchema::prompt_document();
        let mutator = DocumentMutator::new(&schema);
        let doc = sample();
        assert_eq!(
            mutator.get(&doc, &path(&["scenarios", "611f1f77bcf86cd7994390a2", "title"])),
            Some(&json!("Gym"))
        );
        assert_eq!(
            mutator.get(&doc, &path(&["personaPrompts", "maleConfident", "languages", "en"])),
            Some(&json!("old text"))
        );
        assert_eq!(mutator.get(&doc, &path(&["personaPrompts", "nobody"])), None);
    }
}

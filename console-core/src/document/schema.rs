//! Field-kind registry and path classification
//!
//! A path's first segment names a document field. Whether the second
//! segment is a nested field name, a dictionary key or a collection entry id
//! is decided here. Declared fields are classified by their declaration
//! only. Undeclared fields fall back to the live document's shape and then
//! to the object-id pattern, which can be switched off.

use regex::Regex;
use serde_json::Value;
use shared_types::{
    FIELD_CONVERSATION_LENGTHS, FIELD_PERSONA_PROMPTS, FIELD_RELATIONSHIP_LEVELS, FIELD_SCENARIOS,
    ID_FIELD, OBJECT_ID_HEX_LEN,
};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::path::PathAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar or plain nested object
    Plain,
    /// Ordered array of sub-documents addressed by their identifier
    Collection,
    /// Object of sub-documents addressed by a short-name key
    Dictionary,
}

/// Result of classifying one path against the schema and live document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass<'p> {
    TopLevel,
    DictionaryEntry {
        field: &'p str,
        key: &'p str,
        rest: &'p [String],
    },
    CollectionEntry {
        field: &'p str,
        id: &'p str,
        rest: &'p [String],
    },
}

static OBJECT_ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// True for an `OBJECT_ID_HEX_LEN`-character hex string (12-byte identifier encoding).
pub fn is_object_id(segment: &str) -> bool {
    OBJECT_ID_PATTERN
        .get_or_init(|| Regex::new(&format!("^[0-9a-fA-F]{{{OBJECT_ID_HEX_LEN}}}$")).ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(segment))
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: HashMap<String, FieldKind>,
    id_field: String,
    id_heuristic: bool,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::prompt_document()
    }
}

impl FieldSchema {
    /// Schema with nothing declared; every classification uses the fallbacks.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            id_field: ID_FIELD.to_string(),
            id_heuristic: true,
        }
    }

    /// Layout of the prompt configuration document served by the backend.
    pub fn prompt_document() -> Self {
        Self::empty()
            .declare(FIELD_PERSONA_PROMPTS, FieldKind::Dictionary)
            .declare(FIELD_SCENARIOS, FieldKind::Collection)
            .declare(FIELD_RELATIONSHIP_LEVELS, FieldKind::Collection)
            .declare(FIELD_CONVERSATION_LENGTHS, FieldKind::Collection)
    }

    pub fn declare(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(field.into(), kind);
        self
    }

    pub fn without_id_heuristic(mut self) -> Self {
        self.id_heuristic = false;
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    pub fn classify<'p>(&self, path: &'p PathAddress, document: &Value) -> PathClass<'p> {
        let segments = path.segments();
        if segments.len() < 2 {
            return PathClass::TopLevel;
        }
        let field = segments[0].as_str();
        let second = segments[1].as_str();
        let rest = &segments[2..];

        match self.kind_of(field) {
            Some(FieldKind::Dictionary) => PathClass::DictionaryEntry {
                field,
                key: second,
                rest,
            },
            Some(FieldKind::Collection) => PathClass::CollectionEntry {
                field,
                id: second,
                rest,
            },
            Some(FieldKind::Plain) => PathClass::TopLevel,
            None => {
                let live_match = document
                    .get(field)
                    .and_then(Value::as_array)
                    .is_some_and(|items| find_by_id(items, &self.id_field, second).is_some());
                if live_match {
                    return PathClass::CollectionEntry {
                        field,
                        id: second,
                        rest,
                    };
                }
                if self.id_heuristic && is_object_id(second) {
                    tracing::debug!(
                        field,
                        segment = second,
                        "Undeclared field classified as collection by id pattern"
                    );
                    return PathClass::CollectionEntry {
                        field,
                        id: second,
                        rest,
                    };
                }
                PathClass::TopLevel
            }
        }
    }
}

/// Position of the array element whose identifier field equals `id`.
pub fn find_by_id(items: &[Value], id_field: &str, id: &str) -> Option<usize> {
    items.iter().position(|item| {
        item.get(id_field)
            .and_then(Value::as_str)
            .is_some_and(|candidate| candidate == id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> PathAddress {
        PathAddress::new(segments.iter().copied()).unwrap()
    }

    #[test]
    fn test_object_id_pattern() {
        assert!(is_object_id("507f1f77bcf86cd799439011"));
        assert!(is_object_id("507F1F77BCF86CD799439011"));
        assert!(!is_object_id("507f1f77bcf86cd79943901"));
        assert!(!is_object_id("507f1f77bcf86cd79943901z"));
        assert!(!is_object_id("maleConfident"));
        assert!(is_object_id(&"a".repeat(OBJECT_ID_HEX_LEN)));
        assert!(!is_object_id(&"a".repeat(OBJECT_ID_HEX_LEN + 1)));
    }

    #[test]
    fn test_single_segment_is_top_level() {
        let schema = FieldSchema::prompt_document();
        let p = path(&["personaPrompts"]);
        assert_eq!(schema.classify(&p, &json!({})), PathClass::TopLevel);
    }

    #[test]
    fn test_declared_dictionary_keeps_hex_keys_as_dictionary_keys() {
        let schema = FieldSchema::prompt_document();
        let p = path(&["personaPrompts", "507f1f77bcf86cd799439011", "title"]);
        assert_eq!(
            schema.classify(&p, &json!({})),
            PathClass::DictionaryEntry {
                field: "personaPrompts",
                key: "507f1f77bcf86cd799439011",
                rest: &["title".to_string()],
            }
        );
    }

    #[test]
    fn test_declared_collection() {
        let schema = FieldSchema::prompt_document();
        let p = path(&["scenarios", "611f1f77bcf86cd7994390a1", "promptAddOn"]);
        match schema.classify(&p, &json!({})) {
            PathClass::CollectionEntry { field, id, rest } => {
                assert_eq!(field, "scenarios");
                assert_eq!(id, "611f1f77bcf86cd7994390a1");
                assert_eq!(rest, &["promptAddOn".to_string()]);
            }
            other => panic!("unexpected class: {other:?}"),
        }
    }

    #[test]
    fn test_declared_plain_field_ignores_id_pattern() {
        let schema = FieldSchema::empty().declare("buckets", FieldKind::Plain);
        let p = path(&["buckets", "507f1f77bcf86cd799439011"]);
        assert_eq!(schema.classify(&p, &json!({})), PathClass::TopLevel);
    }

    #[test]
    fn test_undeclared_field_falls_back_to_id_pattern() {
        let schema = FieldSchema::empty();
        let hex = path(&["extras", "507f1f77bcf86cd799439011", "title"]);
        assert!(matches!(
            schema.classify(&hex, &json!({})),
            PathClass::CollectionEntry { .. }
        ));
        let plain = path(&["optimized", "languages", "en"]);
        assert_eq!(schema.classify(&plain, &json!({})), PathClass::TopLevel);
    }

    #[test]
    fn test_undeclared_array_with_matching_id_is_collection() {
        let schema = FieldSchema::empty().without_id_heuristic();
        let doc = json!({ "tiers": [ { "_id": "short", "title": "Short" } ] });
        let p = path(&["tiers", "short", "title"]);
        assert!(matches!(
            schema.classify(&p, &doc),
            PathClass::CollectionEntry { id: "short", .. }
        ));
    }

    #[test]
    fn test_heuristic_can_be_disabled() {
        let schema = FieldSchema::empty().without_id_heuristic();
        let p = path(&["extras", "507f1f77bcf86cd799439011"]);
        assert_eq!(schema.classify(&p, &json!({})), PathClass::TopLevel);
    }
}

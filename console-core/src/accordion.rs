//! Expanded/collapsed state of the editor's nested sections.
//!
//! A section is addressed by the path of the container it wraps. Leaves
//! inside a collapsed section are not rendered, so they are not editable.
//! Paths outside every known section are always editable.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::document::{FieldKind, FieldSchema, PathAddress};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccordionState {
    sections: BTreeSet<PathAddress>,
    expanded: BTreeSet<PathAddress>,
}

impl AccordionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections for a loaded document: every top-level container field and
    /// every dictionary entry. Expansion of sections that still exist is kept.
    pub fn sync(&mut self, schema: &FieldSchema, document: &Value) {
        let mut sections = BTreeSet::new();
        if let Value::Object(fields) = document {
            for (field, value) in fields {
                if !(value.is_object() || value.is_array()) {
                    continue;
                }
                let Ok(section) = PathAddress::new([field.as_str()]) else {
                    continue;
                };
                if schema.kind_of(field) == Some(FieldKind::Dictionary) {
                    if let Value::Object(entries) = value {
                        for key in entries.keys() {
                            sections.insert(section.child(key.as_str()));
                        }
                    }
                }
                sections.insert(section);
            }
        }
        self.expanded.retain(|path| sections.contains(path));
        self.sections = sections;
    }

    pub fn sections(&self) -> impl Iterator<Item = &PathAddress> {
        self.sections.iter()
    }

    pub fn is_expanded(&self, section: &PathAddress) -> bool {
        self.expanded.contains(section)
    }

    pub fn expand(&mut self, section: &PathAddress) {
        if self.sections.contains(section) {
            self.expanded.insert(section.clone());
        }
    }

    /// Collapsing a section also collapses everything nested in it.
    pub fn collapse(&mut self, section: &PathAddress) {
        self.expanded.retain(|path| !path.starts_with(section));
    }

    pub fn toggle(&mut self, section: &PathAddress) {
        if self.is_expanded(section) {
            self.collapse(section);
        } else {
            self.expand(section);
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Every known section enclosing `path` must be expanded.
    pub fn is_editable(&self, path: &PathAddress) -> bool {
        self.sections
            .iter()
            .filter(|section| path.is_strict_descendant_of(section))
            .all(|section| self.expanded.contains(section))
    }
}

//! Backend code ↔ display label normalization
//!
//! Language, dialect and style codes appear as keys of the `languages`,
//! `dialects` and `styles` maps (at any depth, so `optimized` variants are
//! covered) and as the values of `language`, `dialect` and `style` fields.
//! Unknown codes and labels pass through unchanged.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Language,
    Dialect,
    Style,
}

impl CodeKind {
    pub const ALL: [CodeKind; 3] = [CodeKind::Language, CodeKind::Dialect, CodeKind::Style];

    /// Field holding a code → text map
    pub fn map_field(self) -> &'static str {
        match self {
            Self::Language => "languages",
            Self::Dialect => "dialects",
            Self::Style => "styles",
        }
    }

    /// Field holding a single code
    pub fn scalar_field(self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Dialect => "dialect",
            Self::Style => "style",
        }
    }

    fn for_map_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.map_field() == field)
    }

    fn for_scalar_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.scalar_field() == field)
    }
}

pub const LANGUAGE_CODES: &[(&str, &str)] = &[("en", "English"), ("ar", "Arabic"), ("arbz", "Arabizi")];

pub const DIALECT_CODES: &[&str] = &[
    "EGYPTIAN",
    "IRAQI",
    "LEVANTINE",
    "GULF",
    "SAUDI",
    "EMIRATI",
    "KUWAITI",
    "LEBANESE",
    "SYRIAN",
    "JORDANIAN",
    "PALESTINIAN",
    "MOROCCAN",
    "ALGERIAN",
    "TUNISIAN",
    "LIBYAN",
    "SUDANESE",
    "YEMENI",
];

pub const STYLE_CODES: &[&str] = &[
    "ROMANTIC",
    "FUNNY",
    "CHEESY",
    "SMOOTH",
    "CONFIDENT",
    "PLAYFUL",
    "POETIC",
    "NERDY",
    "BOLD",
    "SWEET",
];

#[derive(Debug, Clone)]
struct CodeTable {
    kind: CodeKind,
    pairs: Vec<(String, String)>,
}

impl CodeTable {
    fn label(&self, code: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, label)| label.as_str())
    }

    fn code(&self, label: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(_, l)| l == label)
            .map(|(code, _)| code.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToDisplay,
    ToWire,
}

#[derive(Debug, Clone)]
pub struct CodeNormalizer {
    tables: Vec<CodeTable>,
}

impl Default for CodeNormalizer {
    fn default() -> Self {
        Self::standard()
    }
}

/// `EGYPTIAN` → `Egyptian`
pub fn capitalize_first(code: &str) -> String {
    let lower = code.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl CodeNormalizer {
    pub fn standard() -> Self {
        let languages = LANGUAGE_CODES
            .iter()
            .map(|(code, label)| (code.to_string(), label.to_string()))
            .collect();
        let dialects = DIALECT_CODES
            .iter()
            .map(|code| (code.to_string(), capitalize_first(code)))
            .collect();
        let styles = STYLE_CODES
            .iter()
            .map(|code| (code.to_string(), code.to_lowercase()))
            .collect();
        Self {
            tables: vec![
                CodeTable {
                    kind: CodeKind::Language,
                    pairs: languages,
                },
                CodeTable {
                    kind: CodeKind::Dialect,
                    pairs: dialects,
                },
                CodeTable {
                    kind: CodeKind::Style,
                    pairs: styles,
                },
            ],
        }
    }

    fn table(&self, kind: CodeKind) -> Option<&CodeTable> {
        self.tables.iter().find(|table| table.kind == kind)
    }

    pub fn codes(&self, kind: CodeKind) -> Vec<&str> {
        self.table(kind)
            .map(|table| table.pairs.iter().map(|(code, _)| code.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn label_for(&self, kind: CodeKind, code: &str) -> String {
        self.table(kind)
            .and_then(|table| table.label(code))
            .unwrap_or(code)
            .to_string()
    }

    pub fn code_for(&self, kind: CodeKind, label: &str) -> String {
        self.table(kind)
            .and_then(|table| table.code(label))
            .unwrap_or(label)
            .to_string()
    }

    pub fn to_display(&self, document: &Value) -> Value {
        self.convert(document, Direction::ToDisplay)
    }

    pub fn to_wire(&self, document: &Value) -> Value {
        self.convert(document, Direction::ToWire)
    }

    fn translate(&self, kind: CodeKind, raw: &str, direction: Direction) -> Option<String> {
        let table = self.table(kind)?;
        let hit = match direction {
            Direction::ToDisplay => table.label(raw),
            Direction::ToWire => table.code(raw),
        };
        hit.map(str::to_string)
    }

    fn convert(&self, value: &Value, direction: Direction) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let converted = if let Some(kind) = CodeKind::for_map_field(key) {
                        match child {
                            Value::Object(codes) => self.rename_keys(kind, codes, direction),
                            other => self.convert(other, direction),
                        }
                    } else if let (Some(kind), Value::String(code)) =
                        (CodeKind::for_scalar_field(key), child)
                    {
                        Value::String(
                            self.translate(kind, code, direction)
                                .unwrap_or_else(|| code.clone()),
                        )
                    } else {
                        self.convert(child, direction)
                    };
                    out.insert(key.clone(), converted);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.convert(item, direction))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Known codes win over pass-through keys that already look like the
    /// translated form.
    fn rename_keys(&self, kind: CodeKind, codes: &Map<String, Value>, direction: Direction) -> Value {
        let mut out = Map::with_capacity(codes.len());
        let mut passthrough = Vec::new();
        for (key, text) in codes {
            let text = self.convert(text, direction);
            match self.translate(kind, key, direction) {
                Some(renamed) => {
                    out.insert(renamed, text);
                }
                None => passthrough.push((key.clone(), text)),
            }
        }
        for (key, text) in passthrough {
            if out.contains_key(&key) {
                tracing::debug!(key = %key, "Dropping pass-through code shadowed by a known code");
                continue;
            }
            out.insert(key, text);
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_for_every_known_code() {
        let normalizer = CodeNormalizer::standard();
        for kind in CodeKind::ALL {
            for code in normalizer.codes(kind) {
                let label = normalizer.label_for(kind, code);
                assert_eq!(normalizer.code_for(kind, &label), code, "{kind:?} {code}");
            }
        }
    }

    #[test]
    fn test_display_forms() {
        let normalizer = CodeNormalizer::standard();
        assert_eq!(normalizer.label_for(CodeKind::Language, "arbz"), "Arabizi");
        assert_eq!(normalizer.label_for(CodeKind::Dialect, "EGYPTIAN"), "Egyptian");
        assert_eq!(normalizer.label_for(CodeKind::Style, "ROMANTIC"), "romantic");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let normalizer = CodeNormalizer::standard();
        assert_eq!(normalizer.label_for(CodeKind::Language, "fr"), "fr");
        assert_eq!(normalizer.code_for(CodeKind::Dialect, "Martian"), "Martian");
    }

    #[test]
    fn test_document_round_trip_including_optimized_variant() {
        let normalizer = CodeNormalizer::standard();
        let wire = json!({
            "language": "ar",
            "personaPrompts": {
                "maleConfident": {
                    "_id": "A1",
                    "languages": { "en": "hi", "ar": "marhaba", "fr": "salut" },
                    "dialects": { "IRAQI": "shlonak" },
                    "styles": { "CHEESY": "corny" },
                    "optimized": {
                        "languages": { "arbz": "7abibi" },
                        "dialects": { "LEVANTINE": "kifak" }
                    }
                }
            },
            "scenarios": [ { "_id": "s1", "style": "BOLD" } ]
        });

        let display = normalizer.to_display(&wire);
        let persona = &display["personaPrompts"]["maleConfident"];
        assert_eq!(display["language"], "Arabic");
        assert_eq!(persona["languages"]["English"], "hi");
        assert_eq!(persona["languages"]["fr"], "salut");
        assert_eq!(persona["dialects"]["Iraqi"], "shlonak");
        assert_eq!(persona["styles"]["cheesy"], "corny");
        assert_eq!(persona["optimized"]["languages"]["Arabizi"], "7abibi");
        assert_eq!(persona["optimized"]["dialects"]["Levantine"], "kifak");
        assert_eq!(display["scenarios"][0]["style"], "bold");

        assert_eq!(normalizer.to_wire(&display), wire);
    }

    #[test]
    fn test_known_code_wins_over_shadowing_label_key() {
        let normalizer = CodeNormalizer::standard();
        let wire = json!({ "languages": { "en": "code", "English": "label" } });
        let display = normalizer.to_display(&wire);
        assert_eq!(display, json!({ "languages": { "English": "code" } }));
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("MOROCCAN"), "Moroccan");
        assert_eq!(capitalize_first(""), "");
    }
}

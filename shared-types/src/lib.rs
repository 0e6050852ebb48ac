//! Shared types between the console core and the web front end
//!
//! These types are used by both:
//! - the editor core and its HTTP client (native Rust)
//! - Dioxus components (WASM)
//!
//! Serializable with serde for JSON over HTTP. Field names follow the
//! backend's camelCase wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

// ============================================================================
// Document Conventions
// ============================================================================

/// Identifier field carried by every backend sub-document
pub const ID_FIELD: &str = "_id";

/// Length of a hex-encoded 12-byte document identifier
pub const OBJECT_ID_HEX_LEN: usize = 24;

/// `value` tag marking a built-in entry that operators cannot edit or delete
pub const CUSTOM_ENTRY_VALUE: &str = "custom";

/// Fields the server owns; never sent back in a patch root
pub const SERVER_MANAGED_FIELDS: &[&str] = &["_id", "key", "createdAt", "updatedAt"];

/// Top-level document fields
pub const FIELD_PERSONA_PROMPTS: &str = "personaPrompts";
pub const FIELD_SCENARIOS: &str = "scenarios";
pub const FIELD_RELATIONSHIP_LEVELS: &str = "relationshipLevels";
pub const FIELD_CONVERSATION_LENGTHS: &str = "conversationLengths";

// ============================================================================
// Prompt Document Read Models
// ============================================================================

/// Persona prompt stored under a short-name key in `personaPrompts`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PersonaPrompt {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    #[serde(default)]
    pub dialects: BTreeMap<String, String>,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    /// Optimized variant carrying the same field families
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub optimized: Option<serde_json::Value>,
}

/// Scenario or relationship-level entry in an id-keyed collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PromptEntity {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt_add_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PromptEntity {
    /// Built-in entries are hidden from the editable list and never deleted.
    pub fn is_custom(&self) -> bool {
        self.value.as_deref() == Some(CUSTOM_ENTRY_VALUE)
    }
}

/// Message-count bounds for a conversation length tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct MessageRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ConversationLengthTier {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub range: MessageRange,
    #[serde(default)]
    pub prompt_add_on: String,
}

// ============================================================================
// Patch Types
// ============================================================================

/// One grouped update inside a collection or dictionary patch array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PatchGroup {
    pub id: String,
    #[ts(type = "unknown")]
    pub updates: serde_json::Value,
}

// ============================================================================
// API Types
// ============================================================================

/// `GET <config-endpoint>?key=<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPromptResponse {
    pub data: FetchPromptData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPromptData {
    pub response: serde_json::Value,
}

/// `PATCH <config-endpoint>/<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePromptResponse {
    pub data: UpdatePromptData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptData {
    pub updated_prompt: serde_json::Value,
}

/// `POST <attach-endpoint>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct AttachEntityRequest {
    pub parent_id: String,
    pub title: String,
    pub prompt_add_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachEntityResponse {
    pub data: AttachEntityData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachEntityData {
    pub created_entity: serde_json::Value,
}

/// `POST <review-endpoint>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ReviewSubmissionRequest {
    pub submission_id: String,
    pub is_accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
}

/// Pending pickup-line submission awaiting moderation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PickupLineSubmission {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionsResponse {
    pub data: SubmissionsData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionsData {
    pub submissions: Vec<PickupLineSubmission>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub enum PersonaGender {
    Male,
    Female,
}

/// `POST <conversation-endpoint>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ConversationRequest {
    pub persona_gender: PersonaGender,
    pub message_type: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_level_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_length_id: Option<String>,
    pub provider: String,
    pub model: String,
}

/// `POST <prompt-generation-endpoint>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PromptGenerationRequest {
    pub persona_key: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub instructions: String,
    pub provider: String,
    pub model: String,
}

/// Generation endpoints answer with an opaque body the console only displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub data: GenerationData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationData {
    pub response: serde_json::Value,
}

// ============================================================================
// Settings Blobs
// ============================================================================

/// Storage key for the conversation generator defaults
pub const SETTINGS_KEY_CONVERSATION: &str = "conversationGeneratorSettings";
/// Storage key for the prompt generator defaults
pub const SETTINGS_KEY_PROMPT: &str = "promptGeneratorSettings";
/// Storage key for the last active tab name
pub const SETTINGS_KEY_ACTIVE_TAB: &str = "activeTab";

/// Storage key for the auth token
pub const SETTINGS_KEY_TOKEN: &str = "token";

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ConversationSettings {
    pub persona_gender: Option<PersonaGender>,
    pub language: String,
    pub dialect: Option<String>,
    pub style: Option<String>,
    pub provider: String,
    pub model: String,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            persona_gender: None,
            language: DEFAULT_LANGUAGE.to_string(),
            dialect: None,
            style: None,
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct PromptSettings {
    pub language: String,
    pub dialect: Option<String>,
    pub style: Option<String>,
    pub provider: String,
    /// Last model chosen for each provider
    pub models_by_provider: BTreeMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        let mut models_by_provider = BTreeMap::new();
        models_by_provider.insert(DEFAULT_PROVIDER.to_string(), DEFAULT_MODEL.to_string());
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            dialect: None,
            style: None,
            provider: DEFAULT_PROVIDER.to_string(),
            models_by_provider,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    #[test]
    fn test_persona_prompt_deserializes_with_missing_maps() {
        let json = serde_json::json!({ "_id": "A1", "title": "Confident Guy" });
        let prompt: PersonaPrompt = serde_json::from_value(json).unwrap();
        assert_eq!(prompt.id, "A1");
        assert!(prompt.languages.is_empty());
        assert!(prompt.optimized.is_none());
    }

    #[test]
    fn test_prompt_entity_custom_flag() {
        let json = serde_json::json!({
            "_id": "611f1f77bcf86cd7994390a1",
            "title": "Write your own",
            "promptAddOn": "",
            "value": "custom"
        });
        let entity: PromptEntity = serde_json::from_value(json).unwrap();
        assert!(entity.is_custom());
        assert_eq!(entity.prompt_add_on, "");
    }

    #[test]
    fn test_review_request_uses_camel_case() {
        let req = ReviewSubmissionRequest {
            submission_id: "s1".to_string(),
            is_accepted: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "submissionId": "s1", "isAccepted": false }));
    }

    #[test]
    fn test_update_response_requires_updated_prompt() {
        let ok: Result<UpdatePromptResponse, _> =
            serde_json::from_value(serde_json::json!({ "data": { "updatedPrompt": {} } }));
        assert!(ok.is_ok());
        let bad: Result<UpdatePromptResponse, _> =
            serde_json::from_value(serde_json::json!({ "data": { "prompt": {} } }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_gender_serialization() {
        let json = serde_json::to_string(&PersonaGender::Female).unwrap();
        assert_eq!(json, "\"female\"");
    }

    #[test]
    fn test_prompt_settings_default_remembers_default_model() {
        let settings = PromptSettings::default();
        assert_eq!(
            settings.models_by_provider.get(DEFAULT_PROVIDER).map(String::as_str),
            Some(DEFAULT_MODEL)
        );
    }

    #[test]
    fn export_types() {
        // Export all types to TypeScript
        // The export_to attribute in each type's #[ts] macro specifies the output file
        let config = Config::default();
        PersonaPrompt::export(&config).unwrap();
        PromptEntity::export(&config).unwrap();
        MessageRange::export(&config).unwrap();
        ConversationLengthTier::export(&config).unwrap();
        PatchGroup::export(&config).unwrap();
        AttachEntityRequest::export(&config).unwrap();
        ReviewSubmissionRequest::export(&config).unwrap();
        LoginRequest::export(&config).unwrap();
        PickupLineSubmission::export(&config).unwrap();
        PersonaGender::export(&config).unwrap();
        ConversationRequest::export(&config).unwrap();
        PromptGenerationRequest::export(&config).unwrap();
        ConversationSettings::export(&config).unwrap();
        PromptSettings::export(&config).unwrap();
    }
}

//! Sample conversation generator

use serde_json::Value;
use shared_types::{ConversationRequest, ConversationSettings, PersonaGender, DEFAULT_LANGUAGE};

use crate::api::ConsoleApi;
use crate::codes::{CodeKind, CodeNormalizer};
use crate::error::{ApiError, ConsoleError, ValidationErrors};
use crate::notify::{Notice, NoticeQueue};
use crate::session::Session;
use crate::settings::{load_settings, save_settings, SettingsStore};

/// Form fields. Language, dialect and style may hold codes or display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationForm {
    pub persona_gender: Option<PersonaGender>,
    pub message_type: String,
    pub language: String,
    pub dialect: Option<String>,
    pub style: Option<String>,
    pub scenario_id: Option<String>,
    pub relationship_level_id: Option<String>,
    pub conversation_length_id: Option<String>,
    pub provider: String,
    pub model: String,
}

impl From<ConversationSettings> for ConversationForm {
    fn from(settings: ConversationSettings) -> Self {
        Self {
            persona_gender: settings.persona_gender,
            message_type: String::new(),
            language: settings.language,
            dialect: settings.dialect,
            style: settings.style,
            scenario_id: None,
            relationship_level_id: None,
            conversation_length_id: None,
            provider: settings.provider,
            model: settings.model,
        }
    }
}

impl Default for ConversationForm {
    fn default() -> Self {
        ConversationSettings::default().into()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ConversationForm {
    pub fn settings(&self) -> ConversationSettings {
        ConversationSettings {
            persona_gender: self.persona_gender,
            language: self.language.clone(),
            dialect: self.dialect.clone(),
            style: self.style.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
        }
    }

    pub fn validate(&self, normalizer: &CodeNormalizer) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.persona_gender.is_none() {
            errors.add("personaGender", "Persona gender is required");
        }
        if self.message_type.trim().is_empty() {
            errors.add("messageType", "Message type is required");
        }
        let language = normalizer.code_for(CodeKind::Language, self.language.trim());
        if language != DEFAULT_LANGUAGE && present(&self.dialect).is_none() {
            errors.add("dialect", "Dialect is required for non-English conversations");
        }
        errors.into_result()
    }

    pub fn to_request(&self, normalizer: &CodeNormalizer) -> Result<ConversationRequest, ValidationErrors> {
        self.validate(normalizer)?;
        let Some(persona_gender) = self.persona_gender else {
            return Err(ValidationErrors::new());
        };
        let code = |kind, value: Option<&str>| value.map(|v| normalizer.code_for(kind, v));
        Ok(ConversationRequest {
            persona_gender,
            message_type: self.message_type.trim().to_string(),
            language: normalizer.code_for(CodeKind::Language, self.language.trim()),
            dialect: code(CodeKind::Dialect, present(&self.dialect)),
            style: code(CodeKind::Style, present(&self.style)),
            scenario_id: present(&self.scenario_id).map(str::to_string),
            relationship_level_id: present(&self.relationship_level_id).map(str::to_string),
            conversation_length_id: present(&self.conversation_length_id).map(str::to_string),
            provider: self.provider.clone(),
            model: self.model.clone(),
        })
    }
}

pub struct ConversationController {
    pub form: ConversationForm,
    normalizer: CodeNormalizer,
    errors: ValidationErrors,
    generating: bool,
    output: Option<Value>,
    notices: NoticeQueue,
}

impl ConversationController {
    pub fn new(form: ConversationForm) -> Self {
        Self {
            form,
            normalizer: CodeNormalizer::standard(),
            errors: ValidationErrors::new(),
            generating: false,
            output: None,
            notices: NoticeQueue::new(),
        }
    }

    pub fn from_store(store: &dyn SettingsStore) -> Self {
        Self::new(load_settings::<ConversationSettings>(store).into())
    }

    pub fn save_defaults(&self, store: &dyn SettingsStore) {
        save_settings(store, &self.form.settings());
    }

    /// Switching back to the default language drops the dialect.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.form.language = language.into();
        if self.normalizer.code_for(CodeKind::Language, &self.form.language) == DEFAULT_LANGUAGE {
            self.form.dialect = None;
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn begin_generate(&mut self) -> Result<ConversationRequest, ConsoleError> {
        if self.generating {
            return Err(ConsoleError::Busy);
        }
        match self.form.to_request(&self.normalizer) {
            Ok(request) => {
                self.errors = ValidationErrors::new();
                self.generating = true;
                Ok(request)
            }
            Err(errors) => {
                self.notices.error(errors.to_string());
                self.errors = errors.clone();
                Err(errors.into())
            }
        }
    }

    pub fn finish_generate(&mut self, result: Result<Value, ApiError>) -> Result<(), ConsoleError> {
        self.generating = false;
        match result {
            Ok(output) => {
                tracing::info!(provider = %self.form.provider, model = %self.form.model, "Conversation generated");
                self.output = Some(output);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conversation generation failed");
                self.notices.error(format!("Failed to generate conversation: {e}"));
                Err(ConsoleError::Action(e))
            }
        }
    }

    pub async fn generate(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        let request = self.begin_generate()?;
        let result = api.generate_conversation(session, &request).await;
        self.finish_generate(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::FakeApi;
    use crate::settings::MemorySettingsStore;

    fn valid_form() -> ConversationForm {
        ConversationForm {
            persona_gender: Some(PersonaGender::Male),
            message_type: "opener".to_string(),
            ..ConversationForm::default()
        }
    }

    #[test]
    fn test_required_fields() {
        let mut controller = ConversationController::new(ConversationForm::default());
        controller.form.language = "Arabic".to_string();
        assert!(controller.begin_generate().is_err());
        assert!(controller.errors().has("personaGender"));
        assert!(controller.errors().has("messageType"));
        assert!(controller.errors().has("dialect"));
        assert!(!controller.is_generating());
        assert_eq!(controller.take_notices().len(), 1);
    }

    #[test]
    fn test_dialect_optional_for_default_language() {
        let form = valid_form();
        assert!(form.validate(&CodeNormalizer::standard()).is_ok());
    }

    #[test]
    fn test_request_uses_wire_codes() {
        let mut form = valid_form();
        form.language = "Arabic".to_string();
        form.dialect = Some("Egyptian".to_string());
        form.style = Some("romantic".to_string());
        form.scenario_id = Some("  ".to_string());

        let request = form.to_request(&CodeNormalizer::standard()).unwrap();
        assert_eq!(request.language, "ar");
        assert_eq!(request.dialect.as_deref(), Some("EGYPTIAN"));
        assert_eq!(request.style.as_deref(), Some("ROMANTIC"));
        assert_eq!(request.scenario_id, None);
    }

    #[test]
    fn test_switching_to_default_language_clears_dialect() {
        let mut controller = ConversationController::new(valid_form());
        controller.set_language("ar");
        controller.form.dialect = Some("IRAQI".to_string());
        controller.set_language("English");
        assert_eq!(controller.form.dialect, None);
    }

    #[test]
    fn test_defaults_round_trip_through_store() {
        let store = MemorySettingsStore::new();
        let mut controller = ConversationController::from_store(&store);
        controller.form.persona_gender = Some(PersonaGender::Female);
        controller.form.provider = "anthropic".to_string();
        controller.save_defaults(&store);

        let restored = ConversationController::from_store(&store);
        assert_eq!(restored.form.persona_gender, Some(PersonaGender::Female));
        assert_eq!(restored.form.provider, "anthropic");
        assert!(restored.form.message_type.is_empty());
    }

    #[tokio::test]
    async fn test_generate_stores_output() {
        let api = FakeApi::default();
        let session = Session::with_token("t");
        let mut controller = ConversationController::new(valid_form());

        controller.generate(&api, &session).await.unwrap();
        assert!(controller.output().is_some());
        assert_eq!(api.conversations.borrow()[0].message_type, "opener");

        api.fail("conversation");
        let err = controller.generate(&api, &session).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Action(_)));
        assert!(!controller.is_generating());
    }
}

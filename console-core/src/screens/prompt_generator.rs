//! Persona prompt generator with a remembered model per provider

use serde_json::Value;
use shared_types::{PromptGenerationRequest, PromptSettings, DEFAULT_LANGUAGE, DEFAULT_MODEL};
use std::collections::BTreeMap;

use crate::api::ConsoleApi;
use crate::codes::{CodeKind, CodeNormalizer};
use crate::error::{ApiError, ConsoleError, ValidationErrors};
use crate::notify::{Notice, NoticeQueue};
use crate::session::Session;
use crate::settings::{load_settings, save_settings, SettingsStore};

/// Selectable models per provider, first entry is the provider default
pub const PROVIDER_MODELS: &[(&str, &[&str])] = &[
    ("openai", &["gpt-4o", "gpt-4o-mini", "gpt-4.1"]),
    ("anthropic", &["claude-3-5-sonnet-latest", "claude-3-5-haiku-latest"]),
    ("google", &["gemini-1.5-pro", "gemini-1.5-flash"]),
];

pub fn models_for(provider: &str) -> &'static [&'static str] {
    PROVIDER_MODELS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, models)| *models)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptGeneratorForm {
    pub persona_key: String,
    pub language: String,
    pub dialect: Option<String>,
    pub style: Option<String>,
    pub instructions: String,
    pub provider: String,
    pub model: String,
    models_by_provider: BTreeMap<String, String>,
}

impl From<PromptSettings> for PromptGeneratorForm {
    fn from(settings: PromptSettings) -> Self {
        let model = settings
            .models_by_provider
            .get(&settings.provider)
            .cloned()
            .or_else(|| models_for(&settings.provider).first().map(|m| m.to_string()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            persona_key: String::new(),
            language: settings.language,
            dialect: settings.dialect,
            style: settings.style,
            instructions: String::new(),
            provider: settings.provider,
            model,
            models_by_provider: settings.models_by_provider,
        }
    }
}

impl Default for PromptGeneratorForm {
    fn default() -> Self {
        PromptSettings::default().into()
    }
}

impl PromptGeneratorForm {
    pub fn settings(&self) -> PromptSettings {
        PromptSettings {
            language: self.language.clone(),
            dialect: self.dialect.clone(),
            style: self.style.clone(),
            provider: self.provider.clone(),
            models_by_provider: self.models_by_provider.clone(),
        }
    }

    /// Restores the model last used with `provider`.
    pub fn set_provider(&mut self, provider: impl Into<String>) {
        let provider = provider.into();
        self.models_by_provider
            .insert(self.provider.clone(), self.model.clone());
        self.model = self
            .models_by_provider
            .get(&provider)
            .cloned()
            .or_else(|| models_for(&provider).first().map(|m| m.to_string()))
            .unwrap_or_default();
        self.provider = provider;
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        self.models_by_provider
            .insert(self.provider.clone(), self.model.clone());
    }

    pub fn remembered_model(&self, provider: &str) -> Option<&str> {
        self.models_by_provider.get(provider).map(String::as_str)
    }

    pub fn validate(&self, normalizer: &CodeNormalizer) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.persona_key.trim().is_empty() {
            errors.add("personaKey", "Persona is required");
        }
        if self.instructions.trim().is_empty() {
            errors.add("instructions", "Instructions are required");
        }
        if self.model.trim().is_empty() {
            errors.add("model", "Model is required");
        }
        let language = normalizer.code_for(CodeKind::Language, self.language.trim());
        let has_dialect = self.dialect.as_deref().is_some_and(|d| !d.trim().is_empty());
        if language != DEFAULT_LANGUAGE && !has_dialect {
            errors.add("dialect", "Dialect is required for non-English prompts");
        }
        errors.into_result()
    }

    pub fn to_request(&self, normalizer: &CodeNormalizer) -> Result<PromptGenerationRequest, ValidationErrors> {
        self.validate(normalizer)?;
        let code = |kind, value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| normalizer.code_for(kind, v))
        };
        Ok(PromptGenerationRequest {
            persona_key: self.persona_key.trim().to_string(),
            language: normalizer.code_for(CodeKind::Language, self.language.trim()),
            dialect: code(CodeKind::Dialect, &self.dialect),
            style: code(CodeKind::Style, &self.style),
            instructions: self.instructions.trim().to_string(),
            provider: self.provider.clone(),
            model: self.model.trim().to_string(),
        })
    }
}

pub struct PromptGeneratorController {
    pub form: PromptGeneratorForm,
    normalizer: CodeNormalizer,
    errors: ValidationErrors,
    generating: bool,
    output: Option<Value>,
    notices: NoticeQueue,
}

impl PromptGeneratorController {
    pub fn new(form: PromptGeneratorForm) -> Self {
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
        Self::new(load_settings::<PromptSettings>(store).into())
    }

    pub fn save_defaults(&self, store: &dyn SettingsStore) {
        save_settings(store, &self.form.settings());
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

    pub fn begin_generate(&mut self) -> Result<PromptGenerationRequest, ConsoleError> {
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
                tracing::info!(
                    persona = %self.form.persona_key,
                    provider = %self.form.provider,
                    model = %self.form.model,
                    "Prompt generated"
                );
                self.output = Some(output);
                self.notices.success("Prompt generated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Prompt generation failed");
                self.notices.error(format!("Failed to generate prompt: {e}"));
                Err(ConsoleError::Action(e))
            }
        }
    }

    pub async fn generate(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        let request = self.begin_generate()?;
        let result = api.generate_prompt(session, &request).await;
        self.finish_generate(result)
    }
}

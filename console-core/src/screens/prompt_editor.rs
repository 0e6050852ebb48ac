//! Prompt document editor: load, edit, save, and attach/detach entries

use serde_json::Value;
use shared_types::{
    AttachEntityRequest, ConversationLengthTier, PersonaPrompt, PromptEntity,
    FIELD_CONVERSATION_LENGTHS, FIELD_PERSONA_PROMPTS, ID_FIELD,
};

use crate::accordion::AccordionState;
use crate::api::{ConsoleApi, EntityKind};
use crate::codes::CodeNormalizer;
use crate::document::{find_by_id, DirtyEntry, DocumentDraft, FieldSchema, PathAddress};
use crate::error::{ApiError, ConsoleError, ValidationErrors};
use crate::notify::{Notice, NoticeQueue};
use crate::patch::{PatchPayload, PatchPayloadBuilder};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorPhase {
    Idle,
    Loading,
    Loaded,
    /// Blocking message shown in place of the editor
    LoadError(String),
}

/// What the editor shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStatus {
    Idle,
    Loading,
    LoadError,
    Clean,
    Editing,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub id: String,
    pub payload: PatchPayload,
}

/// A delete the operator still has to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: EntityKind,
    pub parent_id: String,
    pub entity_id: String,
    pub title: String,
}

pub struct PromptEditorController {
    key: String,
    schema: FieldSchema,
    normalizer: CodeNormalizer,
    phase: EditorPhase,
    draft: Option<DocumentDraft>,
    /// Entries of the save currently in flight
    saving: Option<Vec<DirtyEntry>>,
    action_in_flight: bool,
    accordion: AccordionState,
    pending_delete: Option<PendingDelete>,
    notices: NoticeQueue,
}

impl PromptEditorController {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_schema(key, FieldSchema::prompt_document(), CodeNormalizer::standard())
    }

    pub fn with_schema(key: impl Into<String>, schema: FieldSchema, normalizer: CodeNormalizer) -> Self {
        Self {
            key: key.into(),
            schema,
            normalizer,
            phase: EditorPhase::Idle,
            draft: None,
            saving: None,
            action_in_flight: false,
            accordion: AccordionState::new(),
            pending_delete: None,
            notices: NoticeQueue::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Switch to another document. Unsaved edits are dropped.
    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
        self.phase = EditorPhase::Idle;
        self.draft = None;
        self.saving = None;
        self.pending_delete = None;
        self.accordion = AccordionState::new();
    }

    pub fn phase(&self) -> &EditorPhase {
        &self.phase
    }

    pub fn status(&self) -> EditorStatus {
        match &self.phase {
            EditorPhase::Idle => EditorStatus::Idle,
            EditorPhase::Loading => EditorStatus::Loading,
            EditorPhase::LoadError(_) => EditorStatus::LoadError,
            EditorPhase::Loaded if self.saving.is_some() => EditorStatus::Saving,
            EditorPhase::Loaded if self.is_modified() => EditorStatus::Editing,
            EditorPhase::Loaded => EditorStatus::Clean,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.draft.as_ref().is_some_and(DocumentDraft::is_modified)
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn draft(&self) -> Option<&DocumentDraft> {
        self.draft.as_ref()
    }

    pub fn document(&self) -> Option<&Value> {
        self.draft.as_ref().map(DocumentDraft::current)
    }

    pub fn normalizer(&self) -> &CodeNormalizer {
        &self.normalizer
    }

    pub fn accordion(&self) -> &AccordionState {
        &self.accordion
    }

    pub fn toggle_section(&mut self, section: &PathAddress) {
        self.accordion.toggle(section);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    fn document_id(&self) -> Result<String, ConsoleError> {
        let draft = self.draft.as_ref().ok_or(ConsoleError::NotLoaded)?;
        draft
            .snapshot()
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ConsoleError::MissingDocumentId)
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    pub fn begin_load(&mut self) -> Result<(), ConsoleError> {
        if self.phase == EditorPhase::Loading {
            return Err(ConsoleError::Busy);
        }
        self.phase = EditorPhase::Loading;
        Ok(())
    }

    /// Normalizes the fetched document for display. Pending edits (made while
    /// a save or this fetch was in flight) are replayed on top of it.
    pub fn finish_load(&mut self, result: Result<Value, ApiError>) -> Result<(), ConsoleError> {
        let document = match result {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load prompt document");
                self.phase = EditorPhase::LoadError(e.to_string());
                return Err(ConsoleError::Fetch(e));
            }
        };

        let document = self.normalizer.to_display(&document);
        let keep_edits = self.is_modified();
        let draft = match self.draft.take() {
            Some(mut draft) if keep_edits => {
                draft.rebase(document);
                draft
            }
            _ => DocumentDraft::new(self.schema.clone(), document),
        };
        self.accordion.sync(&self.schema, draft.current());
        tracing::info!(
            key = %self.key,
            pending = draft.dirty().len(),
            "Prompt document loaded"
        );
        self.draft = Some(draft);
        self.phase = EditorPhase::Loaded;
        Ok(())
    }

    pub async fn load(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        self.begin_load()?;
        let result = api.fetch_prompt(session, &self.key).await;
        self.finish_load(result)
    }

    // ------------------------------------------------------------------
    // Edit
    // ------------------------------------------------------------------

    pub fn value_at(&self, path: &PathAddress) -> Option<&Value> {
        self.draft.as_ref().and_then(|draft| draft.value_at(path))
    }

    pub fn edit(&mut self, path: PathAddress, value: Value) -> Result<(), ConsoleError> {
        if !self.accordion.is_editable(&path) {
            return Err(ConsoleError::SectionCollapsed(path.key()));
        }
        let draft = self.draft.as_mut().ok_or(ConsoleError::NotLoaded)?;
        draft.edit(path, value)?;
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(draft) = self.draft.as_mut() {
            draft.cancel();
        }
        self.pending_delete = None;
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    pub fn begin_save(&mut self) -> Result<SaveRequest, ConsoleError> {
        if self.saving.is_some() {
            return Err(ConsoleError::Busy);
        }
        let id = self.document_id()?;
        let draft = self.draft.as_ref().ok_or(ConsoleError::NotLoaded)?;
        if !draft.is_modified() {
            return Err(ConsoleError::NothingToSave);
        }

        let submitted: Vec<DirtyEntry> = draft.dirty().entries().cloned().collect();
        let payload = PatchPayloadBuilder::new(draft.schema(), &self.normalizer).build(
            &submitted,
            draft.snapshot(),
            draft.current(),
        );
        if payload.is_empty() {
            tracing::debug!(key = %self.key, "Dirty entries produced an empty patch");
            return Err(ConsoleError::NothingToSave);
        }

        tracing::info!(key = %self.key, id = %id, entries = submitted.len(), "Saving prompt document");
        self.saving = Some(submitted);
        Ok(SaveRequest { id, payload })
    }

    /// On success only the submitted entries are cleared; edits made while
    /// the save was in flight stay dirty on top of the server's document.
    pub fn finish_save(&mut self, result: Result<Value, ApiError>) -> Result<(), ConsoleError> {
        let submitted = self.saving.take().unwrap_or_default();
        match result {
            Ok(updated) => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.acknowledge(&submitted);
                    if updated.is_object() {
                        draft.rebase(self.normalizer.to_display(&updated));
                    }
                }
                self.notices.success("Changes saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to save prompt document");
                self.notices.error(format!("Failed to save changes: {e}"));
                Err(ConsoleError::Save(e))
            }
        }
    }

    /// Submit, then re-fetch to resync with the server.
    pub async fn save(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        let request = self.begin_save()?;
        let result = api.update_prompt(session, &request.id, &request.payload).await;
        self.finish_save(result)?;
        self.load(api, session).await
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    fn collection(&self, field: &str) -> &[Value] {
        self.document()
            .and_then(|document| document.get(field))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Operator-editable entries; built-in `custom` entries are left out.
    pub fn entries(&self, kind: EntityKind) -> Vec<PromptEntity> {
        self.collection(kind.field())
            .iter()
            .filter_map(|item| serde_json::from_value::<PromptEntity>(item.clone()).ok())
            .filter(|entity| !entity.is_custom())
            .collect()
    }

    pub fn conversation_lengths(&self) -> Vec<ConversationLengthTier> {
        self.collection(FIELD_CONVERSATION_LENGTHS)
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }

    pub fn persona_prompts(&self) -> Vec<(String, PersonaPrompt)> {
        let Some(Value::Object(prompts)) = self
            .document()
            .and_then(|document| document.get(FIELD_PERSONA_PROMPTS))
        else {
            return Vec::new();
        };
        prompts
            .iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<PersonaPrompt>(value.clone())
                    .ok()
                    .map(|prompt| (key.clone(), prompt))
            })
            .collect()
    }

    pub fn begin_attach(
        &mut self,
        kind: EntityKind,
        title: &str,
        prompt_add_on: &str,
    ) -> Result<AttachEntityRequest, ConsoleError> {
        if self.action_in_flight {
            return Err(ConsoleError::Busy);
        }
        let mut errors = ValidationErrors::new();
        if title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if prompt_add_on.trim().is_empty() {
            errors.add("promptAddOn", "Prompt add-on is required");
        }
        if let Err(errors) = errors.into_result() {
            self.notices.error(format!("Cannot add {}: {errors}", kind.label()));
            return Err(errors.into());
        }

        let parent_id = self.document_id()?;
        self.action_in_flight = true;
        Ok(AttachEntityRequest {
            parent_id,
            title: title.trim().to_string(),
            prompt_add_on: prompt_add_on.to_string(),
        })
    }

    pub fn finish_attach(&mut self, kind: EntityKind, result: Result<Value, ApiError>) -> Result<(), ConsoleError> {
        self.action_in_flight = false;
        match result {
            Ok(created) => {
                tracing::info!(
                    key = %self.key,
                    kind = kind.label(),
                    id = created.get(ID_FIELD).and_then(|v| v.as_str()).unwrap_or_default(),
                    "Entry attached"
                );
                self.notices.success(format!("Added {}", kind.label()));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(key = %self.key, kind = kind.label(), error = %e, "Failed to attach entry");
                self.notices.error(format!("Failed to add {}: {e}", kind.label()));
                Err(ConsoleError::Action(e))
            }
        }
    }

    /// Attach, then re-fetch so the new entry shows up.
    pub async fn attach(
        &mut self,
        api: &dyn ConsoleApi,
        session: &Session,
        kind: EntityKind,
        title: &str,
        prompt_add_on: &str,
    ) -> Result<(), ConsoleError> {
        let request = self.begin_attach(kind, title, prompt_add_on)?;
        let result = api.attach_entity(session, kind, &request).await;
        self.finish_attach(kind, result)?;
        self.load(api, session).await
    }

    /// First step of a delete. Nothing is sent until [`Self::begin_delete`].
    pub fn request_delete(&mut self, kind: EntityKind, entity_id: &str) -> Result<(), ConsoleError> {
        let parent_id = self.document_id()?;
        let items = self.collection(kind.field());
        let entity = find_by_id(items, self.schema.id_field(), entity_id)
            .and_then(|index| serde_json::from_value::<PromptEntity>(items[index].clone()).ok())
            .ok_or_else(|| ConsoleError::UnknownEntry {
                field: kind.field(),
                id: entity_id.to_string(),
            })?;
        if entity.is_custom() {
            return Err(ConsoleError::ProtectedEntry { id: entity.id });
        }
        self.pending_delete = Some(PendingDelete {
            kind,
            parent_id,
            entity_id: entity.id,
            title: entity.title,
        });
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn begin_delete(&mut self) -> Result<PendingDelete, ConsoleError> {
        if self.action_in_flight {
            return Err(ConsoleError::Busy);
        }
        let pending = self.pending_delete.take().ok_or(ConsoleError::NothingToConfirm)?;
        self.action_in_flight = true;
        Ok(pending)
    }

    pub fn finish_delete(&mut self, pending: &PendingDelete, result: Result<(), ApiError>) -> Result<(), ConsoleError> {
        self.action_in_flight = false;
        let label = pending.kind.label();
        match result {
            Ok(()) => {
                tracing::info!(key = %self.key, kind = label, id = %pending.entity_id, "Entry detached");
                self.notices.success(format!("Deleted {label} \"{}\"", pending.title));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(key = %self.key, kind = label, error = %e, "Failed to detach entry");
                self.notices.error(format!("Failed to delete {label}: {e}"));
                Err(ConsoleError::Action(e))
            }
        }
    }

    /// Send the confirmed delete, then re-fetch.
    pub async fn confirm_delete(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        let pending = self.begin_delete()?;
        let result = api
            .detach_entity(session, pending.kind, &pending.parent_id, &pending.entity_id)
            .await;
        self.finish_delete(&pending, result)?;
        self.load(api, session).await
    }
}

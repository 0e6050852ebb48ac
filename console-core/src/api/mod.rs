//! Backend API contract consumed by the screen controllers

pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{
    AttachEntityRequest, ConversationRequest, LoginRequest, PickupLineSubmission,
    PromptGenerationRequest, ReviewSubmissionRequest, FIELD_RELATIONSHIP_LEVELS, FIELD_SCENARIOS,
};

use crate::error::ApiError;
use crate::patch::PatchPayload;
use crate::session::Session;

pub use http::HttpConsoleApi;

/// Collection entries that can be attached to and detached from a prompt
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Scenario,
    RelationshipLevel,
}

impl EntityKind {
    /// Document field holding entries of this kind
    pub fn field(self) -> &'static str {
        match self {
            Self::Scenario => FIELD_SCENARIOS,
            Self::RelationshipLevel => FIELD_RELATIONSHIP_LEVELS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scenario => "scenario",
            Self::RelationshipLevel => "relationship level",
        }
    }
}

/// Futures are `?Send`: the browser build runs on a single-threaded executor.
#[async_trait(?Send)]
pub trait ConsoleApi {
    /// Returns the bearer token for a new session.
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

    async fn fetch_prompt(&self, session: &Session, key: &str) -> Result<Value, ApiError>;

    /// Returns the server's updated document.
    async fn update_prompt(
        &self,
        session: &Session,
        id: &str,
        payload: &PatchPayload,
    ) -> Result<Value, ApiError>;

    /// Returns the created entity.
    async fn attach_entity(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &AttachEntityRequest,
    ) -> Result<Value, ApiError>;

    async fn detach_entity(
        &self,
        session: &Session,
        kind: EntityKind,
        parent_id: &str,
        entity_id: &str,
    ) -> Result<(), ApiError>;

    async fn list_submissions(&self, session: &Session) -> Result<Vec<PickupLineSubmission>, ApiError>;

    async fn review_submission(
        &self,
        session: &Session,
        request: &ReviewSubmissionRequest,
    ) -> Result<(), ApiError>;

    async fn generate_conversation(
        &self,
        session: &Session,
        request: &ConversationRequest,
    ) -> Result<Value, ApiError>;

    async fn generate_prompt(
        &self,
        session: &Session,
        request: &PromptGenerationRequest,
    ) -> Result<Value, ApiError>;
}

//! reqwest-backed implementation of the console API. Works natively and in
//! the browser (reqwest uses `fetch` on wasm32).

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{
    AttachEntityRequest, AttachEntityResponse, ConversationRequest, FetchPromptResponse,
    GenerationResponse, LoginRequest, LoginResponse, PickupLineSubmission, PromptGenerationRequest,
    ReviewSubmissionRequest, SubmissionsResponse, UpdatePromptResponse,
};

use super::{ConsoleApi, EntityKind};
use crate::config::ConsoleConfig;
use crate::error::ApiError;
use crate::patch::PatchPayload;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct HttpConsoleApi {
    client: reqwest::Client,
    config: ConsoleConfig,
}

impl HttpConsoleApi {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    fn attach_url(&self, kind: EntityKind) -> String {
        match kind {
            EntityKind::Scenario => self.config.url(&self.config.endpoints.scenario_attach),
            EntityKind::RelationshipLevel => self
                .config
                .url(&self.config.endpoints.relationship_level_attach),
        }
    }

    fn detach_url(&self, kind: EntityKind) -> String {
        match kind {
            EntityKind::Scenario => self.config.url(&self.config.endpoints.scenario_detach),
            EntityKind::RelationshipLevel => self
                .config
                .url(&self.config.endpoints.relationship_level_detach),
        }
    }
}

/// Requests without a token still go out; the server answers 401.
fn authorize(builder: RequestBuilder, session: &Session) -> RequestBuilder {
    match session.bearer() {
        Some(bearer) => builder.header(AUTHORIZATION, bearer),
        None => builder,
    }
}

async fn describe_http_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return ApiError::Status {
            status,
            message: "empty body".to_string(),
        };
    }

    if let Ok(json) = serde_json::from_str::<Value>(&body) {
        if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
            return ApiError::Status {
                status,
                message: error.to_string(),
            };
        }
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return ApiError::Status {
                status,
                message: message.to_string(),
            };
        }
    }

    ApiError::Status {
        status,
        message: body,
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    let response = builder.send().await?;
    if !response.status().is_success() {
        return Err(describe_http_error(response).await);
    }
    Ok(response)
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let response = send(builder).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::UnexpectedShape(e.to_string()))
}

#[async_trait(?Send)]
impl ConsoleApi for HttpConsoleApi {
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let url = self.config.url(&self.config.endpoints.login);
        let data: LoginResponse = send_json(self.client.post(&url).json(request)).await?;
        Ok(data.data.token)
    }

    async fn fetch_prompt(&self, session: &Session, key: &str) -> Result<Value, ApiError> {
        let url = self.config.url(&self.config.endpoints.prompts);
        tracing::debug!(url = %url, key, "Fetching prompt document");
        let request = authorize(self.client.get(&url).query(&[("key", key)]), session);
        let data: FetchPromptResponse = send_json(request).await?;
        Ok(data.data.response)
    }

    async fn update_prompt(
        &self,
        session: &Session,
        id: &str,
        payload: &PatchPayload,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.config.url(&self.config.endpoints.prompts), id);
        tracing::debug!(url = %url, fields = payload.as_map().len(), "Submitting prompt patch");
        let request = authorize(self.client.patch(&url).json(payload), session);
        let data: UpdatePromptResponse = send_json(request).await?;
        Ok(data.data.updated_prompt)
    }

    async fn attach_entity(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &AttachEntityRequest,
    ) -> Result<Value, ApiError> {
        let url = self.attach_url(kind);
        let builder = authorize(self.client.post(&url).json(request), session);
        let data: AttachEntityResponse = send_json(builder).await?;
        Ok(data.data.created_entity)
    }

    async fn detach_entity(
        &self,
        session: &Session,
        kind: EntityKind,
        parent_id: &str,
        entity_id: &str,
    ) -> Result<(), ApiError> {
        let url = self.detach_url(kind);
        let builder = authorize(
            self.client
                .delete(&url)
                .query(&[("parentId", parent_id), ("entityId", entity_id)]),
            session,
        );
        send(builder).await?;
        Ok(())
    }

    async fn list_submissions(&self, session: &Session) -> Result<Vec<PickupLineSubmission>, ApiError> {
        let url = self.config.url(&self.config.endpoints.submissions);
        let data: SubmissionsResponse = send_json(authorize(self.client.get(&url), session)).await?;
        Ok(data.data.submissions)
    }

    async fn review_submission(
        &self,
        session: &Session,
        request: &ReviewSubmissionRequest,
    ) -> Result<(), ApiError> {
        let url = self.config.url(&self.config.endpoints.review);
        send(authorize(self.client.post(&url).json(request), session)).await?;
        Ok(())
    }

    async fn generate_conversation(
        &self,
        session: &Session,
        request: &ConversationRequest,
    ) -> Result<Value, ApiError> {
        let url = self.config.url(&self.config.endpoints.generate_conversation);
        let data: GenerationResponse =
            send_json(authorize(self.client.post(&url).json(request), session)).await?;
        Ok(data.data.response)
    }

    async fn generate_prompt(
        &self,
        session: &Session,
        request: &PromptGenerationRequest,
    ) -> Result<Value, ApiError> {
        let url = self.config.url(&self.config.endpoints.generate_prompt);
        let data: GenerationResponse =
            send_json(authorize(self.client.post(&url).json(request), session)).await?;
        Ok(data.data.response)
    }
}

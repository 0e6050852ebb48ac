// ============================================================================
// Error Types
// ============================================================================

use std::fmt;

use crate::document::MutateError;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {status} ({message})")]
    Status { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::UnexpectedShape(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// One required-field failure, keyed by the form field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Used by the UI to outline invalid inputs.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures surfaced at a screen controller boundary
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConsoleError {
    #[error("Failed to load: {0}")]
    Fetch(ApiError),

    #[error("Failed to save: {0}")]
    Save(ApiError),

    #[error("Action failed: {0}")]
    Action(ApiError),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Edit(#[from] MutateError),

    #[error("No document loaded")]
    NotLoaded,

    #[error("Loaded document has no identifier")]
    MissingDocumentId,

    #[error("Section containing {0} is collapsed")]
    SectionCollapsed(String),

    #[error("Entry {id} is built in and cannot be deleted")]
    ProtectedEntry { id: String },

    #[error("No {field} entry with id {id}")]
    UnknownEntry { field: &'static str, id: String },

    #[error("Nothing awaiting confirmation")]
    NothingToConfirm,

    #[error("Nothing to save")]
    NothingToSave,

    #[error("Operation already in progress")]
    Busy,
}

impl From<ValidationErrors> for ConsoleError {
    fn from(e: ValidationErrors) -> Self {
        ConsoleError::Validation(e)
    }
}

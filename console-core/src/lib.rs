//! Persona console core
//!
//! The prompt document editor (path addressing, partial mutation, dirty
//! tracking and sparse patch building), code normalization, the backend API
//! client and the controllers behind each console screen. Nothing here
//! depends on the UI framework.

pub mod accordion;
pub mod api;
pub mod codes;
pub mod config;
pub mod document;
pub mod error;
pub mod notify;
pub mod patch;
pub mod screens;
pub mod session;
pub mod settings;

pub use accordion::AccordionState;
pub use api::{ConsoleApi, EntityKind, HttpConsoleApi};
pub use codes::{CodeKind, CodeNormalizer};
pub use config::{built_in_console_config, load_console_config, ConsoleConfig};
pub use document::{DocumentDraft, FieldSchema, PathAddress};
pub use error::{ApiError, ConsoleError, ValidationErrors};
pub use notify::{Notice, NoticeLevel};
pub use patch::{PatchPayload, PatchPayloadBuilder};
pub use session::Session;
pub use settings::{MemorySettingsStore, SettingsStore};

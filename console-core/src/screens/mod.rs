//! Screen controllers
//!
//! Each controller owns its form or document state and turns API results
//! into notices. Operations that hit the network are split into a
//! synchronous `begin_*` that validates and builds the request, and a
//! `finish_*` that folds the response back in. The async wrappers chain the
//! two around an [`ConsoleApi`](crate::api::ConsoleApi) call; a UI holding
//! the controller in a signal can instead call the halves itself and release
//! its borrow across the await.

pub mod conversation;
pub mod login;
pub mod moderation;
pub mod prompt_editor;
pub mod prompt_generator;

pub use conversation::{ConversationController, ConversationForm};
pub use login::{LoginController, LoginForm};
pub use moderation::{ModerationController, PendingReject};
pub use prompt_editor::{EditorPhase, EditorStatus, PendingDelete, PromptEditorController, SaveRequest};
pub use prompt_generator::{PromptGeneratorController, PromptGeneratorForm, PROVIDER_MODELS};

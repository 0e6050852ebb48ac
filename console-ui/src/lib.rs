pub mod api;
pub mod components;
pub mod editor;
pub mod generators;
pub mod moderation;
pub mod shell;
pub mod storage;

pub use api::*;
pub use components::*;
pub use editor::*;
pub use generators::*;
pub use moderation::*;
pub use shell::*;

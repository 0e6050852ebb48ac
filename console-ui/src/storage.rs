//! Browser `localStorage` persistence

use console_core::settings::{load_session, save_session};
use console_core::{Session, SettingsStore};

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|window| window.local_storage().ok().flatten())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStorageStore;

impl SettingsStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage().and_then(|storage| storage.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) {
        let Some(storage) = local_storage() else {
            return;
        };
        if storage.set_item(key, value).is_err() {
            dioxus_logger::tracing::warn!(key, "Failed to write localStorage item");
        }
    }

    fn remove(&self, key: &str) {
        let Some(storage) = local_storage() else {
            return;
        };
        if storage.remove_item(key).is_err() {
            dioxus_logger::tracing::warn!(key, "Failed to remove localStorage item");
        }
    }
}

pub fn cached_session() -> Session {
    load_session(&LocalStorageStore)
}

pub fn cache_session(session: &Session) {
    save_session(&LocalStorageStore, session);
}

//! Persisted generator defaults and the last active tab.
//!
//! Each blob is a flat JSON object merged over the compiled-in defaults, so a
//! blob written by an older build with fewer keys still loads. Anything that
//! fails to parse is replaced by the defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::{
    ConversationSettings, PromptSettings, SETTINGS_KEY_ACTIVE_TAB, SETTINGS_KEY_CONVERSATION,
    SETTINGS_KEY_PROMPT, SETTINGS_KEY_TOKEN,
};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::session::Session;

/// String key/value storage (browser `localStorage` or an in-memory map)
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Blob types stored under a fixed key
pub trait SettingsBlob: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;
}

impl SettingsBlob for ConversationSettings {
    const KEY: &'static str = SETTINGS_KEY_CONVERSATION;
}

impl SettingsBlob for PromptSettings {
    const KEY: &'static str = SETTINGS_KEY_PROMPT;
}

pub fn load_settings<T: SettingsBlob>(store: &dyn SettingsStore) -> T {
    let Some(raw) = store.get(T::KEY) else {
        return T::default();
    };
    match merge_over_defaults::<T>(&raw) {
        Some(settings) => settings,
        None => {
            tracing::debug!(key = T::KEY, "Stored settings unreadable; resetting to defaults");
            let defaults = T::default();
            save_settings(store, &defaults);
            defaults
        }
    }
}

pub fn save_settings<T: SettingsBlob>(store: &dyn SettingsStore, settings: &T) {
    match serde_json::to_string(settings) {
        Ok(raw) => store.set(T::KEY, &raw),
        Err(e) => tracing::warn!(key = T::KEY, error = %e, "Failed to serialize settings"),
    }
}

fn merge_over_defaults<T: SettingsBlob>(raw: &str) -> Option<T> {
    let Value::Object(stored) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    let Value::Object(mut merged) = serde_json::to_value(T::default()).ok()? else {
        return None;
    };
    for (key, value) in stored {
        if merged.contains_key(&key) {
            merged.insert(key, value);
        }
    }
    serde_json::from_value(Value::Object(merged)).ok()
}

pub fn load_active_tab(store: &dyn SettingsStore) -> Option<String> {
    store
        .get(SETTINGS_KEY_ACTIVE_TAB)
        .filter(|tab| !tab.trim().is_empty())
}

pub fn save_active_tab(store: &dyn SettingsStore, tab: &str) {
    store.set(SETTINGS_KEY_ACTIVE_TAB, tab);
}

pub fn load_session(store: &dyn SettingsStore) -> Session {
    store
        .get(SETTINGS_KEY_TOKEN)
        .map(Session::with_token)
        .unwrap_or_default()
}

/// Store the token, or clear it for an anonymous session.
pub fn save_session(store: &dyn SettingsStore, session: &Session) {
    match session.token() {
        Some(token) => store.set(SETTINGS_KEY_TOKEN, token),
        None => store.remove(SETTINGS_KEY_TOKEN),
    }
}

//! Console API configuration
//!
//! Resolution order: `CONSOLE_CONFIG_PATH`, then `console-core/config/console.toml`
//! in the current directory or any ancestor, then the built-in example.
//! `CONSOLE_API_BASE` overrides the base URL afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONSOLE_CONFIG_PATH: &str = "console-core/config/console.toml";
const BUILTIN_CONSOLE_CONFIG_TOML: &str = include_str!("../config/console.example.toml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub prompts: String,
    pub scenario_attach: String,
    pub scenario_detach: String,
    pub relationship_level_attach: String,
    pub relationship_level_detach: String,
    pub submissions: String,
    pub review: String,
    pub generate_conversation: String,
    pub generate_prompt: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".to_string(),
            prompts: "/api/prompts".to_string(),
            scenario_attach: "/api/prompts/scenario".to_string(),
            scenario_detach: "/api/prompts/scenario".to_string(),
            relationship_level_attach: "/api/prompts/relationship-level".to_string(),
            relationship_level_detach: "/api/prompts/relationship-level".to_string(),
            submissions: "/api/pickup-lines/submissions".to_string(),
            review: "/api/pickup-lines/review".to_string(),
            generate_conversation: "/api/generate/conversation".to_string(),
            generate_prompt: "/api/generate/prompt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub endpoints: Endpoints,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

pub fn load_console_config() -> ConsoleConfig {
    let explicit_path = std::env::var("CONSOLE_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);

    let mut config = match explicit_path.or_else(|| find_default_config_path(DEFAULT_CONSOLE_CONFIG_PATH)) {
        Some(path) => load_console_config_from(&path),
        None => {
            tracing::info!("No console config file found; using built-in defaults");
            built_in_console_config()
        }
    };

    if let Ok(api_base) = std::env::var("CONSOLE_API_BASE") {
        if !api_base.trim().is_empty() {
            config.api_base = api_base;
        }
    }
    config
}

pub fn load_console_config_from(path: &Path) -> ConsoleConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Failed to load console config file; using built-in defaults"
            );
            return built_in_console_config();
        }
    };
    ConsoleConfig::from_toml_str(&content).unwrap_or_else(|err| {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "Failed to parse console config TOML; using built-in defaults"
        );
        built_in_console_config()
    })
}

/// Configuration compiled in from `config/console.example.toml`.
pub fn built_in_console_config() -> ConsoleConfig {
    ConsoleConfig::from_toml_str(BUILTIN_CONSOLE_CONFIG_TOML).unwrap_or_else(|err| {
        tracing::error!(error = %err, "Failed to parse built-in console config");
        ConsoleConfig::default()
    })
}

fn find_default_config_path(relative_path: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let candidate = current.join(relative_path);
        if candidate.exists() && candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn restore_env(key: &str, previous: Option<String>) {
        if let Some(value) = previous {
            std::env::set_var(key, value);
        } else {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_built_in_matches_defaults() {
        assert_eq!(built_in_console_config(), ConsoleConfig::default());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = ConsoleConfig::default().with_api_base("https://admin.example.com/");
        assert_eq!(config.url("/api/prompts"), "https://admin.example.com/api/prompts");
        assert_eq!(config.url("api/prompts"), "https://admin.example.com/api/prompts");
    }

    #[test]
    fn test_partial_file_keeps_default_endpoints() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("console.toml");
        std::fs::write(
            &path,
            r#"
api_base = "https://staging.example.com"

[endpoints]
prompts = "/v2/prompts"
"#,
        )
        .expect("write config");

        let config = load_console_config_from(&path);
        assert_eq!(config.api_base, "https://staging.example.com");
        assert_eq!(config.endpoints.prompts, "/v2/prompts");
        assert_eq!(config.endpoints.review, Endpoints::default().review);
    }

    #[test]
    fn test_invalid_file_falls_back_to_built_in() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("console.toml");
        std::fs::write(&path, "api_base = [").expect("write config");
        assert_eq!(load_console_config_from(&path), ConsoleConfig::default());
        assert_eq!(
            load_console_config_from(&temp_dir.path().join("missing.toml")),
            ConsoleConfig::default()
        );
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("console.toml");
        std::fs::write(&path, "[endpoints]\nlogin = \"/auth\"\n").expect("write config");

        let previous_path = std::env::var("CONSOLE_CONFIG_PATH").ok();
        let previous_base = std::env::var("CONSOLE_API_BASE").ok();
        std::env::set_var("CONSOLE_CONFIG_PATH", &path);
        std::env::set_var("CONSOLE_API_BASE", "https://prod.example.com");

        let config = load_console_config();

        restore_env("CONSOLE_CONFIG_PATH", previous_path);
        restore_env("CONSOLE_API_BASE", previous_base);

        assert_eq!(config.endpoints.login, "/auth");
        assert_eq!(config.api_base, "https://prod.example.com");
    }
}

use console_core::{built_in_console_config, HttpConsoleApi};
use std::sync::OnceLock;

/// Get the API base URL based on current environment
/// - In development (localhost): use http://localhost:8080
/// - In production: use same origin (API serves the console)
fn get_api_base() -> String {
    let location = web_sys::window().map(|w| w.location());
    let hostname = location
        .as_ref()
        .and_then(|l| l.hostname().ok())
        .unwrap_or_default();

    if hostname == "localhost" || hostname == "127.0.0.1" {
        "http://localhost:8080".to_string()
    } else {
        // reqwest needs an absolute URL, so spell out the origin
        location.and_then(|l| l.origin().ok()).unwrap_or_default()
    }
}

static API_BASE_CACHE: OnceLock<String> = OnceLock::new();

pub fn api_base() -> &'static str {
    API_BASE_CACHE.get_or_init(get_api_base).as_str()
}

/// Client shared through context by every screen
pub fn console_api() -> HttpConsoleApi {
    HttpConsoleApi::new(built_in_console_config().with_api_base(api_base()))
}

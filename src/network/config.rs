use serde::Deserialize;

use crate::constants::{DEFAULT_MODEL, FALLBACK_API_BASE_URL};
use crate::settings::Theme;

/// Optional `window.env` block a deployment can inject before the module
/// loads. Every key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct WindowEnv {
    pub api_base_url: Option<String>,
    pub enable_debug: Option<bool>,
    pub default_model: Option<String>,
    pub theme: Option<String>,
}

impl WindowEnv {
    #[cfg(target_arch = "wasm32")]
    pub fn read() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let raw = match js_sys::Reflect::get(&window, &wasm_bindgen::JsValue::from_str("env")) {
            Ok(raw) if !raw.is_undefined() && !raw.is_null() => raw,
            _ => return Self::default(),
        };
        serde_wasm_bindgen::from_value(raw).unwrap_or_else(|e| {
            log::warn!("ignoring malformed window.env: {}", e);
            Self::default()
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn read() -> Self {
        Self::default()
    }
}

/// API route configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    /// Points at the local development backend. Production start-up goes
    /// through [`ApiConfig::resolve`].
    fn default() -> Self {
        Self::from_url(FALLBACK_API_BASE_URL)
    }
}

impl ApiConfig {
    /// `window.env.API_BASE_URL`, then build-time `API_BASE_URL`, then the
    /// page origin + `/api`, then the localhost fallback.
    pub fn resolve() -> Self {
        Self::resolve_with(&WindowEnv::read())
    }

    pub fn resolve_with(env: &WindowEnv) -> Self {
        if let Some(url) = env.api_base_url.as_deref().filter(|u| !u.is_empty()) {
            return Self::from_url(url);
        }
        if let Some(url) = option_env!("API_BASE_URL") {
            return Self::from_url(url);
        }
        if let Some(origin) = page_origin() {
            return Self::from_url(&format!("{}/api", origin));
        }
        Self::default()
    }

    pub fn from_url(url: &str) -> Self {
        Self { base_url: url.trim_end_matches('/').to_string() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/agents/42`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// WebSocket URL for an API path (`http` -> `ws`, `https` -> `wss`).
    pub fn ws_url(&self, path: &str) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}{}", ws_base, path)
    }
}

#[cfg(target_arch = "wasm32")]
fn page_origin() -> Option<String> {
    let origin = web_sys::window()?.location().origin().ok()?;
    // file:// pages report "null"
    if origin.is_empty() || origin == "null" {
        None
    } else {
        Some(origin)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn page_origin() -> Option<String> {
    None
}

/// Deployment flags: build-time defaults, optionally overridden at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub debug: bool,
    pub default_model: String,
    pub default_theme: Theme,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            default_model: option_env!("AGENTK_DEFAULT_MODEL")
                .unwrap_or(DEFAULT_MODEL)
                .to_string(),
            default_theme: option_env!("AGENTK_DEFAULT_THEME")
                .and_then(Theme::parse)
                .unwrap_or_default(),
        }
    }
}

impl Environment {
    /// Build-time defaults overlaid with `window.env`.
    pub fn resolve() -> Self {
        Self::default().with_overrides(&WindowEnv::read())
    }

    pub fn with_overrides(mut self, env: &WindowEnv) -> Self {
        if let Some(debug) = env.enable_debug {
            self.debug = debug;
        }
        if let Some(model) = env.default_model.as_deref().filter(|m| !m.is_empty()) {
            self.default_model = model.to_string();
        }
        if let Some(theme) = env.theme.as_deref().and_then(Theme::parse) {
            self.default_theme = theme;
        }
        self
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_MUX_API_URL, DEFAULT_MUX_CORS_ORIGIN, DEFAULT_PORT,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for the admin server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    pub max_upload_size: usize,
    /// Shared bearer credential; `None` disables the gate.
    pub api_token: Option<String>,
    pub mux_api_url: String,
    pub mux_cors_origin: String,
    /// Credentials used when nothing has been stored through `mux-settings`.
    pub mux_access_token: Option<String>,
    pub mux_secret_key: Option<String>,
    pub mux_webhook_signing_secret: Option<String>,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

/// Read a string variable, treating empty or whitespace-only values as unset.
fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DB_PATH").map(expand_tilde).unwrap_or_else(|_| {
                let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_dir = home.join(".cache").join("muxup");
                cache_dir.join("db").to_string_lossy().to_string()
            }),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            api_token: non_empty_env("API_TOKEN"),
            mux_api_url: non_empty_env("MUX_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_MUX_API_URL.to_string()),
            mux_cors_origin: non_empty_env("MUX_CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_MUX_CORS_ORIGIN.to_string()),
            mux_access_token: non_empty_env("MUX_ACCESS_TOKEN"),
            mux_secret_key: non_empty_env("MUX_SECRET_KEY"),
            mux_webhook_signing_secret: non_empty_env("MUX_WEBHOOK_SIGNING_SECRET"),
        }
    }

    /// Configuration suitable for tests and embedding: no auth gate, no
    /// fallback credentials, default Mux endpoints.
    pub fn for_db_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            port: 0,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            api_token: None,
            mux_api_url: DEFAULT_MUX_API_URL.to_string(),
            mux_cors_origin: DEFAULT_MUX_CORS_ORIGIN.to_string(),
            mux_access_token: None,
            mux_secret_key: None,
            mux_webhook_signing_secret: None,
        }
    }
}

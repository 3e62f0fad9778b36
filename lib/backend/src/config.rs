//! Backend connection configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the hosted backend.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g. "https://abcd.example.co").
    pub url: String,
    /// Publishable API key sent with every request.
    pub api_key: String,
    /// Per-request timeout for backend calls, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Name of the cookie (or chunked cookie family) holding the session.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Sessions expiring within this many seconds are refreshed eagerly.
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: i64,
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_cookie_name() -> String {
    "tatame-auth-token".to_string()
}

fn default_refresh_margin_seconds() -> i64 {
    60
}

impl BackendConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            request_timeout_ms: default_request_timeout_ms(),
            cookie_name: default_cookie_name(),
            refresh_margin_seconds: default_refresh_margin_seconds(),
        }
    }
}

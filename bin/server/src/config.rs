//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! a double underscore, e.g. `BACKEND__URL` or `GATE__PROTECTED_PREFIX`.
//!
//! See [`BackendConfig`](tatame_backend::BackendConfig) for the backend
//! connection settings and [`ThrottleConfig`](tatame_access::ThrottleConfig)
//! for login throttling.

use serde::Deserialize;
use std::time::Duration;
use tatame_access::{CookieOptions, GatePolicy, SameSitePolicy, ThrottleConfig};
use tatame_backend::BackendConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Hosted backend connection.
    pub backend: BackendConfig,

    /// Authorization gate configuration.
    #[serde(default)]
    pub gate: GateConfig,

    /// Session cookie attributes.
    #[serde(default)]
    pub session: SessionCookieConfig,

    /// Failed-login throttling.
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Authorization gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Paths starting with this prefix require a staff role.
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,

    /// Where unauthenticated and forbidden callers are sent.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Upper bound for each session or role store call, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_protected_prefix() -> String {
    "/staff".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_call_timeout_ms() -> u64 {
    5_000
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefix: default_protected_prefix(),
            login_path: default_login_path(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl GateConfig {
    /// Builds the gate policy, rejecting prefixes that cannot host the staff area.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or login path is not an absolute path,
    /// if the prefix is the site root, or if the login path is protected.
    pub fn policy(&self) -> Result<GatePolicy, config::ConfigError> {
        let prefix = self.protected_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "gate.protected_prefix must be a non-root absolute path, got '{}'",
                self.protected_prefix
            )));
        }
        if !self.login_path.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "gate.login_path must be an absolute path, got '{}'",
                self.login_path
            )));
        }
        let policy = GatePolicy::new(prefix, self.login_path.clone());
        if policy.is_protected(&self.login_path) {
            return Err(config::ConfigError::Message(format!(
                "gate.login_path '{}' must not be under the protected prefix '{}'",
                self.login_path, prefix
            )));
        }
        Ok(policy)
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCookieConfig {
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Cookie lifetime in seconds. The backend bounds the session itself.
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: i64,
}

fn default_secure_cookies() -> bool {
    true
}

/// 400 days, the longest lifetime browsers honour.
fn default_max_age_seconds() -> i64 {
    34_560_000
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            secure_cookies: default_secure_cookies(),
            max_age_seconds: default_max_age_seconds(),
        }
    }
}

impl SessionCookieConfig {
    #[must_use]
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: "/".to_string(),
            max_age_seconds: Some(self.max_age_seconds),
            http_only: true,
            secure: self.secure_cookies,
            same_site: SameSitePolicy::Lax,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

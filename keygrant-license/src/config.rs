//! Client configuration.

use crate::error::{LicenseError, LicenseResult};
use crate::request::Scope;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of challenge/exchange rounds before the handshake gives up.
pub const MAX_POLL_ATTEMPTS: u32 = 30;

/// Fixed backoff between polling attempts, in seconds.
pub const POLL_INTERVAL_SECS: u64 = 3;

/// Default lifetime of an authorization request, in minutes.
pub const DEFAULT_EXPIRES_MINUTES: u32 = 30;

/// Default per-request HTTP timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How the HTTP transport picks a proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "url")]
pub enum ProxySetting {
    /// Use the proxy environment (`HTTPS_PROXY`, `HTTP_PROXY`, `NO_PROXY`, ...),
    /// read once per process by the HTTP client.
    #[default]
    System,
    /// Never use a proxy.
    Direct,
    /// Always use this proxy URL.
    Explicit(String),
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the licensing API; endpoint paths are appended to it.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Proxy selection.
    pub proxy: ProxySetting,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            proxy: ProxySetting::default(),
        }
    }
}

impl TransportConfig {
    /// Creates a config for the given API base URL with default settings.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Default::default()
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Authorization handshake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// URL of the page where the user approves requests.
    pub auth_base_url: String,
    /// Application name shown to the user on the approval page.
    pub app_name: String,
    /// Device name shown on the approval page. Defaults to the hostname.
    pub device_name: Option<String>,
    /// Lifetime of the authorization request in minutes.
    pub expires_minutes: u32,
    /// Maximum number of polling attempts.
    pub max_attempts: u32,
    /// Delay between polling attempts in seconds.
    pub poll_interval_secs: u64,
    /// Capabilities requested for the session token.
    pub scope: Scope,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            auth_base_url: String::new(),
            app_name: String::new(),
            device_name: None,
            expires_minutes: DEFAULT_EXPIRES_MINUTES,
            max_attempts: MAX_POLL_ATTEMPTS,
            poll_interval_secs: POLL_INTERVAL_SECS,
            scope: Scope::license_keys(),
        }
    }
}

impl HandshakeConfig {
    /// Returns the backoff between polling attempts.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Checks that the fields a handshake cannot run without are set.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.auth_base_url.trim().is_empty() {
            return Err(LicenseError::Config("auth_base_url is empty".to_string()));
        }
        if self.app_name.trim().is_empty() {
            return Err(LicenseError::Config("app_name is empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(LicenseError::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Signed payload verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Reject payloads signed longer ago than this. `None` disables the check.
    pub max_signature_age_secs: Option<u64>,
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub handshake: HandshakeConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

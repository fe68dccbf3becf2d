//! Connection parameters
//!
//! Values supplied by the caller can be overridden through `GAMELIFT_SDK_*`
//! environment variables; the environment always wins.

use std::env;
use std::fmt;

use super::ConfigError;

pub const ENV_WEBSOCKET_URL: &str = "GAMELIFT_SDK_WEBSOCKET_URL";
pub const ENV_PROCESS_ID: &str = "GAMELIFT_SDK_PROCESS_ID";
pub const ENV_HOST_ID: &str = "GAMELIFT_SDK_HOST_ID";
pub const ENV_FLEET_ID: &str = "GAMELIFT_SDK_FLEET_ID";
pub const ENV_AUTH_TOKEN: &str = "GAMELIFT_SDK_AUTH_TOKEN";

/// Everything needed to open one connection to the orchestration endpoint
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServerParameters {
    pub websocket_url: String,
    pub process_id: String,
    pub host_id: String,
    pub fleet_id: String,
    pub auth_token: String,
}

impl ServerParameters {
    #[must_use]
    pub fn new(
        websocket_url: impl Into<String>,
        process_id: impl Into<String>,
        host_id: impl Into<String>,
        fleet_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            process_id: process_id.into(),
            host_id: host_id.into(),
            fleet_id: fleet_id.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Build parameters purely from the environment (after loading `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::default().resolve()
    }

    /// Apply environment overrides and validate
    pub fn resolve(self) -> Result<Self, ConfigError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup` and validate
    pub fn resolve_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (ENV_WEBSOCKET_URL, &mut self.websocket_url),
            (ENV_PROCESS_ID, &mut self.process_id),
            (ENV_HOST_ID, &mut self.host_id),
            (ENV_FLEET_ID, &mut self.fleet_id),
            (ENV_AUTH_TOKEN, &mut self.auth_token),
        ];
        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Every value must be non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("WebSocketUrl", &self.websocket_url),
            ("ProcessId", &self.process_id),
            ("HostId", &self.host_id),
            ("FleetId", &self.fleet_id),
            ("AuthToken", &self.auth_token),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::MissingValue(*name)),
            None => Ok(()),
        }
    }

    /// Same identity, new endpoint and token
    #[must_use]
    pub fn with_endpoint(&self, websocket_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            auth_token: auth_token.into(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ServerParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerParameters")
            .field("websocket_url", &self.websocket_url)
            .field("process_id", &self.process_id)
            .field("host_id", &self.host_id)
            .field("fleet_id", &self.fleet_id)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

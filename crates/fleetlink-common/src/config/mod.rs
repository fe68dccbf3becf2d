//! Configuration
//!
//! Connection parameters with environment overrides, and the protocol tunables.

mod client_config;
mod server_parameters;

pub use client_config::ClientConfig;
pub use server_parameters::{
    ServerParameters, ENV_AUTH_TOKEN, ENV_FLEET_ID, ENV_HOST_ID, ENV_PROCESS_ID,
    ENV_WEBSOCKET_URL,
};

use fleetlink_core::FleetError;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingValue(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl From<ConfigError> for FleetError {
    fn from(err: ConfigError) -> Self {
        FleetError::BadRequest(err.to_string())
    }
}

//! # fleetlink-common
//!
//! Shared utilities including connection parameters, client tunables and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ClientConfig, ConfigError, ServerParameters};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};

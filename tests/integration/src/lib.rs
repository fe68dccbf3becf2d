//! Integration test utilities for the fleet client
//!
//! This crate runs a local WebSocket endpoint that plays the orchestration
//! service, so tests can drive the client over a real socket.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

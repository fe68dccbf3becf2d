//! # fleetlink-client
//!
//! Client-side protocol engine that lets a game server process join a managed
//! fleet: one persistent WebSocket to the orchestration endpoint, correlated
//! request/response calls, session lifecycle callbacks and health reporting.

pub mod connection;
pub mod correlator;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use connection::{ConnectionManager, MessageHandler, MessageSender, RetryPolicy};
pub use correlator::RequestCorrelator;
pub use session::{LogParameters, ProcessParameters, ServerState};
pub use transport::{Channel, ChannelEvent, ConnectionState, Transport, WebSocketTransport};

/// Version reported to the service when connecting and activating
pub const SDK_VERSION: &str = "5.3.0";

/// Language reported to the service when connecting and activating
pub const SDK_LANGUAGE: &str = "Rust";

//! Test support
//!
//! An in-memory [`Transport`](crate::transport::Transport) that can be
//! scripted to accept or reject connects, records every frame sent, and
//! replies through a configurable responder.

mod mock_transport;

pub use mock_transport::{ack, ConnectBehavior, MockTransport, Responder};

//! Connection management
//!
//! Owns the one live channel to the orchestration endpoint: connect with
//! retry, close classification, refresh flips and inbound demultiplexing.

mod handler;
mod manager;
mod retry;
mod uri;

pub use handler::{MessageHandler, MessageSender};
pub use manager::ConnectionManager;
pub use retry::RetryPolicy;
pub use uri::build_connection_uri;

//! Transport abstraction
//!
//! A duplex text channel with connect/send/close and an event stream.
//! The connection manager only ever talks to these traits.

mod websocket;

pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Lifecycle of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Event emitted by a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Open,
    Message(String),
    Close { code: u16, reason: String },
    Error(String),
}

/// Where a channel delivers its events
pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;

/// Transport errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Channel is not open")]
    NotOpen,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Close failed: {0}")]
    Close(String),
}

/// Opens channels
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt to open a channel to `uri`.
    ///
    /// Always returns a channel; a failed attempt returns one whose state is
    /// not `Open` and emits a `Close` event carrying the classifying code.
    async fn connect(&self, uri: &str, events: EventSender) -> Arc<dyn Channel>;
}

/// One open (or failed) duplex channel
#[async_trait]
pub trait Channel: Send + Sync {
    fn state(&self) -> ConnectionState;

    async fn send(&self, text: String) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

//! WebSocket transport on `tokio-tungstenite`
//!
//! Each open channel runs a reader task (frames in, events out) and a writer
//! task (outbound queue to the sink). A failed handshake still produces a
//! `Close` event so the connection manager can classify it.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{Channel, ChannelEvent, ConnectionState, EventSender, Transport, TransportError};
use crate::protocol::CloseCode;

/// Default upper bound on the opening handshake
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens WebSocket channels
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_handshake_timeout(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, uri: &str, events: EventSender) -> Arc<dyn Channel> {
        match tokio::time::timeout(self.handshake_timeout, connect_async(uri)).await {
            Ok(Ok((stream, response))) => {
                tracing::debug!(status = %response.status(), "WebSocket handshake completed");
                let _ = events.send(ChannelEvent::Open);
                WebSocketChannel::spawn(stream, events)
            }
            Ok(Err(e)) => {
                let code = handshake_close_code(&e);
                tracing::error!(error = %e, code, "WebSocket handshake failed");
                FailedChannel::report(&events, code, e.to_string())
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.handshake_timeout.as_millis(),
                    "WebSocket handshake timed out"
                );
                FailedChannel::report(
                    &events,
                    CloseCode::Abnormal.as_u16(),
                    "handshake timed out".to_string(),
                )
            }
        }
    }
}

/// An HTTP rejection of the credentials maps to a protocol error, anything
/// else (refused, reset, DNS) to an abnormal closure.
fn handshake_close_code(error: &tungstenite::Error) -> u16 {
    match error {
        tungstenite::Error::Http(response)
            if matches!(response.status().as_u16(), 401 | 403) =>
        {
            CloseCode::ProtocolError.as_u16()
        }
        _ => CloseCode::Abnormal.as_u16(),
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WebSocketChannel {
    state: Arc<RwLock<ConnectionState>>,
    outbound: mpsc::UnboundedSender<Message>,
    events: EventSender,
    reader: AbortHandle,
}

impl WebSocketChannel {
    fn spawn(stream: WsStream, events: EventSender) -> Arc<dyn Channel> {
        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let state = Arc::new(RwLock::new(ConnectionState::Open));

        let writer_events = events.clone();
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    let _ = writer_events.send(ChannelEvent::Error(e.to_string()));
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader_state = Arc::clone(&state);
        let reader_events = events.clone();
        let reader = tokio::spawn(async move {
            let mut close_code = CloseCode::Abnormal.as_u16();
            let mut close_reason = String::from("connection dropped");

            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let _ = reader_events.send(ChannelEvent::Message(text.to_string()));
                    }
                    Ok(Message::Close(frame)) => {
                        *reader_state.write() = ConnectionState::Closing;
                        match frame {
                            Some(frame) => {
                                close_code = u16::from(frame.code);
                                close_reason = frame.reason.to_string();
                            }
                            None => {
                                close_code = CloseCode::NoStatus.as_u16();
                                close_reason.clear();
                            }
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::warn!(len = data.len(), "Ignoring binary frame");
                    }
                    Ok(_) => {
                        tracing::trace!("Control frame received");
                    }
                    Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                        break;
                    }
                    Err(e) => {
                        let _ = reader_events.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }

            *reader_state.write() = ConnectionState::Closed;
            let _ = reader_events.send(ChannelEvent::Close {
                code: close_code,
                reason: close_reason,
            });
        })
        .abort_handle();

        Arc::new(Self {
            state,
            outbound,
            events,
            reader,
        })
    }
}

#[async_trait]
impl Channel for WebSocketChannel {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Open {
            return Err(TransportError::NotOpen);
        }
        self.outbound
            .send(Message::text(text))
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        let previous = {
            let mut state = self.state.write();
            let previous = *state;
            if previous == ConnectionState::Open {
                *state = ConnectionState::Closing;
            }
            previous
        };

        match previous {
            ConnectionState::Open => self
                .outbound
                .send(Message::Close(None))
                .map_err(|e| TransportError::Close(e.to_string())),
            ConnectionState::Closing => {
                // The peer never answered our close frame; stop reading.
                self.reader.abort();
                *self.state.write() = ConnectionState::Closed;
                let _ = self.events.send(ChannelEvent::Close {
                    code: CloseCode::Abnormal.as_u16(),
                    reason: "closed locally".to_string(),
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Stand-in for a channel whose handshake never completed
struct FailedChannel;

impl FailedChannel {
    fn report(events: &EventSender, code: u16, reason: String) -> Arc<dyn Channel> {
        let _ = events.send(ChannelEvent::Close { code, reason });
        Arc::new(Self)
    }
}

#[async_trait]
impl Channel for FailedChannel {
    fn state(&self) -> ConnectionState {
        ConnectionState::Closed
    }

    async fn send(&self, _text: String) -> Result<(), TransportError> {
        Err(TransportError::NotOpen)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

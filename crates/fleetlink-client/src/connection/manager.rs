//! Connection manager
//!
//! Holds the active channel and replaces it atomically on (re)connect.

use async_trait::async_trait;
use fleetlink_common::{ClientConfig, ServerParameters};
use fleetlink_core::{FleetError, FleetResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

use super::{build_connection_uri, MessageHandler, MessageSender, RetryPolicy};
use crate::protocol::{CloseCode, InboundMessage, OutboundMessage};
use crate::transport::{Channel, ChannelEvent, ConnectionState, Transport};

/// Upper bound on waiting for a failed attempt's close event
const CLASSIFICATION_WAIT: Duration = Duration::from_secs(5);

/// Error text the transport reports for a failed close of a dying socket
const CLOSING_ERROR_MARKER: &str = "An error has occurred in closing the connection";

type HandlerSlot = Arc<RwLock<Option<Weak<dyn MessageHandler>>>>;

/// Manages the single live connection to the orchestration endpoint
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,

    /// Channel used for all sends
    active: RwLock<Option<Arc<dyn Channel>>>,

    /// Receiver of inbound frames, shared with every dispatch task
    handler: HandlerSlot,

    retry: RetryPolicy,
    disconnect_poll_attempts: u32,
    disconnect_poll_interval: Duration,

    /// Serializes connect sequences (initial connect and refreshes)
    connect_lock: Mutex<()>,

    /// Bumped by `disconnect` under the `active` write lock; a connect
    /// sequence started before the bump must not install its channel
    disconnects: AtomicU64,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            active: RwLock::new(None),
            handler: Arc::new(RwLock::new(None)),
            retry: RetryPolicy::from(config),
            disconnect_poll_attempts: config.disconnect_poll_attempts,
            disconnect_poll_interval: config.disconnect_poll_interval,
            connect_lock: Mutex::new(()),
            disconnects: AtomicU64::new(0),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared(transport: Arc<dyn Transport>, config: &ClientConfig) -> Arc<Self> {
        Arc::new(Self::new(transport, config))
    }

    /// Route inbound frames to `handler`.
    ///
    /// Held weakly; frames arriving after the handler is dropped are discarded.
    pub fn set_handler(&self, handler: Weak<dyn MessageHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// State of the active channel
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.active
            .read()
            .as_ref()
            .map_or(ConnectionState::Disconnected, |channel| channel.state())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Connect to the endpoint in `params`, retrying with backoff.
    ///
    /// Individual attempt failures are logged; only exhaustion is returned,
    /// classified from the last attempt's close code. On success the new
    /// channel replaces the active one and the previous channel is closed in
    /// the background.
    ///
    /// A `disconnect` issued while the sequence is still running wins: the
    /// sequence stops retrying and a channel it opens afterwards is closed
    /// instead of installed.
    pub async fn connect(&self, params: &ServerParameters) -> FleetResult<()> {
        let epoch = self.disconnects.load(Ordering::Acquire);
        let _guard = self.connect_lock.lock().await;
        let uri = build_connection_uri(params).map_err(|e| {
            tracing::error!(endpoint = %params.websocket_url, error = %e, "Invalid endpoint");
            FleetError::bad_request(format!("invalid endpoint {}: {e}", params.websocket_url))
        })?;
        let mut retry = 0;

        loop {
            if self.disconnects.load(Ordering::Acquire) != epoch {
                return Err(self.abandon(params, None).await);
            }

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (close_tx, close_rx) = watch::channel(None);
            tokio::spawn(dispatch_events(events_rx, Arc::clone(&self.handler), close_tx));

            tracing::debug!(
                endpoint = %params.websocket_url,
                process_id = %params.process_id,
                attempt = retry + 1,
                "Connecting"
            );
            let channel = self.transport.connect(&uri, events_tx).await;

            if channel.state() == ConnectionState::Open {
                if !self.flip(Arc::clone(&channel), epoch) {
                    return Err(self.abandon(params, Some(channel)).await);
                }
                tracing::info!(
                    endpoint = %params.websocket_url,
                    fleet_id = %params.fleet_id,
                    "Connected to orchestration endpoint"
                );
                return Ok(());
            }

            if retry >= self.retry.max_retries {
                let error = classify_failure(close_rx).await;
                if let Err(e) = channel.close().await {
                    tracing::debug!(error = %e, "Failed to close unsuccessful channel");
                }
                tracing::error!(
                    endpoint = %params.websocket_url,
                    attempts = retry + 1,
                    backoff_ms = self.retry.total_delay().as_millis() as u64,
                    error = %error,
                    "Giving up connecting"
                );
                return Err(error);
            }

            retry += 1;
            let delay = self.retry.delay_for(retry);
            tracing::warn!(
                endpoint = %params.websocket_url,
                retry,
                delay_ms = delay.as_millis() as u64,
                "Connection attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Make `channel` the active one and close the previous channel.
    ///
    /// Returns false, leaving the active slot untouched, when a disconnect
    /// happened since `epoch` was read.
    fn flip(&self, channel: Arc<dyn Channel>, epoch: u64) -> bool {
        let previous = {
            let mut active = self.active.write();
            if self.disconnects.load(Ordering::Acquire) != epoch {
                return false;
            }
            active.replace(channel)
        };

        if let Some(previous) = previous {
            tokio::spawn(async move {
                if let Err(e) = previous.close().await {
                    tracing::warn!(error = %e, "Failed to close previous connection");
                }
            });
        }
        true
    }

    /// Stop a connect sequence overtaken by `disconnect`
    async fn abandon(
        &self,
        params: &ServerParameters,
        opened: Option<Arc<dyn Channel>>,
    ) -> FleetError {
        if let Some(channel) = opened {
            if let Err(e) = channel.close().await {
                tracing::debug!(error = %e, "Failed to close abandoned channel");
            }
        }
        tracing::warn!(
            endpoint = %params.websocket_url,
            "Connect abandoned after disconnect"
        );
        FleetError::ConnectFailure
    }

    /// Close the active channel.
    ///
    /// A channel already closing gets a bounded number of polls to finish
    /// before it is closed forcibly.
    pub async fn disconnect(&self) -> FleetResult<()> {
        let channel = {
            let mut active = self.active.write();
            self.disconnects.fetch_add(1, Ordering::AcqRel);
            active.take()
        };
        let Some(channel) = channel else {
            return Ok(());
        };

        let mut polls = 0;
        while channel.state() == ConnectionState::Closing && polls < self.disconnect_poll_attempts {
            tokio::time::sleep(self.disconnect_poll_interval).await;
            polls += 1;
        }

        if channel.state() != ConnectionState::Closed {
            channel.close().await.map_err(|e| {
                tracing::warn!(error = %e, "Failed to close connection");
                FleetError::service_call_failed(e.to_string())
            })?;
        }

        tracing::info!("Disconnected from orchestration endpoint");
        Ok(())
    }
}

#[async_trait]
impl MessageSender for ConnectionManager {
    async fn send_message(&self, message: &OutboundMessage) -> FleetResult<()> {
        let text = message.to_json().map_err(|e| {
            FleetError::service_call_failed(format!("failed to serialize {message}: {e}"))
        })?;

        let channel = self
            .active
            .read()
            .clone()
            .ok_or_else(|| FleetError::service_call_failed("not connected"))?;

        channel.send(text).await.map_err(|e| {
            tracing::warn!(message = %message, error = %e, "Failed to send message");
            FleetError::service_call_failed(e.to_string())
        })?;

        tracing::trace!(message = %message, "Message sent");
        Ok(())
    }
}

/// Wait for the close classification of a failed attempt
async fn classify_failure(mut close_rx: watch::Receiver<Option<FleetError>>) -> FleetError {
    let classified = tokio::time::timeout(CLASSIFICATION_WAIT, close_rx.wait_for(Option::is_some))
        .await
        .ok()
        .and_then(Result::ok)
        .and_then(|error| error.clone());

    classified.unwrap_or(FleetError::ConnectFailure)
}

/// Drain one channel's events until the channel drops its sender
async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    handler: HandlerSlot,
    close_tx: watch::Sender<Option<FleetError>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Open => {
                tracing::debug!("Channel opened");
            }
            ChannelEvent::Message(text) => {
                let current = handler.read().as_ref().and_then(Weak::upgrade);
                match current {
                    Some(current) => route_frame(&text, current.as_ref()),
                    None => tracing::debug!("No handler registered, dropping frame"),
                }
            }
            ChannelEvent::Close { code, reason } => {
                let error = CloseCode::classify(code);
                tracing::info!(code, reason = %reason, classified = %error, "Channel closed");
                close_tx.send_replace(Some(error));
            }
            ChannelEvent::Error(message) if message.contains(CLOSING_ERROR_MARKER) => {
                tracing::warn!(error = %message, "Error while closing channel");
            }
            ChannelEvent::Error(message) => {
                tracing::error!(error = %message, "Channel error");
            }
        }
    }
}

/// Decode one text frame and hand it to the handler
fn route_frame(text: &str, handler: &dyn MessageHandler) {
    let message = match InboundMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, frame = %text, "Dropping malformed frame");
            return;
        }
    };

    match message {
        InboundMessage::Response {
            request_id,
            outcome,
        } => handler.on_response(&request_id, outcome),
        InboundMessage::CreateGameSession(game_session) => {
            handler.on_start_game_session(game_session);
        }
        InboundMessage::UpdateGameSession(update) => handler.on_update_game_session(update),
        InboundMessage::TerminateProcess { termination_time } => {
            handler.on_terminate_process(termination_time);
        }
        InboundMessage::RefreshConnection {
            endpoint,
            auth_token,
        } => handler.on_refresh_connection(endpoint, auth_token),
        InboundMessage::Unsolicited { action } => {
            tracing::debug!(action = %action, "Ignoring unsolicited message");
        }
    }
}

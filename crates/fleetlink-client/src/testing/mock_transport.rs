//! Scripted in-memory transport

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::transport::{
    Channel, ChannelEvent, ConnectionState, EventSender, Transport, TransportError,
};

/// Outcome of one connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectBehavior {
    #[default]
    Accept,
    /// Fail the handshake and close with `code`
    Reject { code: u16 },
    /// Hold the handshake until `MockTransport::release`, then accept
    Hold,
}

/// Produces the reply to a sent frame, if any
pub type Responder = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Reply to every request with a 200 acknowledgement
#[must_use]
pub fn ack(frame: &Value) -> Option<Value> {
    Some(json!({
        "Action": frame["Action"],
        "RequestId": frame["RequestId"],
        "StatusCode": 200,
    }))
}

#[derive(Default)]
struct Shared {
    script: Mutex<VecDeque<ConnectBehavior>>,
    fallback: Mutex<ConnectBehavior>,
    uris: Mutex<Vec<String>>,
    channels: Mutex<Vec<Arc<MockChannel>>>,
    sent: Mutex<Vec<Value>>,
    sent_notify: Notify,
    responder: RwLock<Option<Responder>>,
    release: Notify,
    close_calls: AtomicUsize,
}

/// In-memory transport recording everything the client does
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Accept every connection and acknowledge every request
    #[must_use]
    pub fn new() -> Self {
        let transport = Self {
            shared: Arc::new(Shared::default()),
        };
        transport.set_responder(ack);
        transport
    }

    /// Behaviors for the next connect attempts, in order
    pub fn script(&self, behaviors: impl IntoIterator<Item = ConnectBehavior>) {
        self.shared.script.lock().extend(behaviors);
    }

    /// Reject every unscripted attempt with `code`
    pub fn reject_all(&self, code: u16) {
        *self.shared.fallback.lock() = ConnectBehavior::Reject { code };
    }

    pub fn accept_all(&self) {
        *self.shared.fallback.lock() = ConnectBehavior::Accept;
    }

    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        *self.shared.responder.write() = Some(Arc::new(responder));
    }

    /// Never answer; requests run into their timeout
    pub fn silent(&self) {
        *self.shared.responder.write() = None;
    }

    /// Push a frame from the service on the newest open channel
    pub fn deliver(&self, frame: Value) -> bool {
        self.latest_open()
            .is_some_and(|channel| channel.emit(ChannelEvent::Message(frame.to_string())))
    }

    /// Drop the newest open channel as if the peer went away
    pub fn close_active(&self, code: u16) {
        if let Some(channel) = self.latest_open() {
            channel.terminate(code, "closed by peer");
        }
    }

    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.shared.uris.lock().len()
    }

    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.shared.uris.lock().clone()
    }

    /// States of every channel handed out, oldest first
    #[must_use]
    pub fn channel_states(&self) -> Vec<ConnectionState> {
        self.shared.channels.lock().iter().map(|c| c.state()).collect()
    }

    /// Every frame sent, parsed
    #[must_use]
    pub fn sent(&self) -> Vec<Value> {
        self.shared.sent.lock().clone()
    }

    #[must_use]
    pub fn sent_actions(&self) -> Vec<String> {
        self.shared
            .sent
            .lock()
            .iter()
            .filter_map(|frame| frame["Action"].as_str().map(str::to_string))
            .collect()
    }

    #[must_use]
    pub fn count_action(&self, action: &str) -> usize {
        self.sent_actions().iter().filter(|a| *a == action).count()
    }

    /// Wait until `count` frames with `action` were sent; returns the last one
    pub async fn wait_for_action(&self, action: &str, count: usize) -> Value {
        let count = count.max(1);
        loop {
            let notified = self.shared.sent_notify.notified();
            let matching: Vec<Value> = self
                .shared
                .sent
                .lock()
                .iter()
                .filter(|frame| frame["Action"] == action)
                .cloned()
                .collect();
            if matching.len() >= count {
                if let Some(frame) = matching.into_iter().nth(count - 1) {
                    return frame;
                }
            }
            notified.await;
        }
    }

    /// Let one held handshake complete
    pub fn release(&self) {
        self.shared.release.notify_one();
    }

    /// The peer starts the closing handshake on the newest open channel and
    /// never finishes it
    pub fn begin_closing(&self) {
        if let Some(channel) = self.latest_open() {
            *channel.state.write() = ConnectionState::Closing;
        }
    }

    /// The peer completes the closing handshake on the newest closing channel
    pub fn finish_closing(&self, code: u16) {
        let closing = self
            .shared
            .channels
            .lock()
            .iter()
            .rev()
            .find(|c| c.state() == ConnectionState::Closing)
            .cloned();
        if let Some(channel) = closing {
            channel.terminate(code, "closed by peer");
        }
    }

    /// Number of `Channel::close` calls made by the client
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.shared.close_calls.load(Ordering::SeqCst)
    }

    fn latest_open(&self) -> Option<Arc<MockChannel>> {
        self.shared
            .channels
            .lock()
            .iter()
            .rev()
            .find(|c| c.state() == ConnectionState::Open)
            .cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, uri: &str, events: EventSender) -> Arc<dyn Channel> {
        self.shared.uris.lock().push(uri.to_string());
        let behavior = self
            .shared
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.shared.fallback.lock());

        if behavior == ConnectBehavior::Hold {
            self.shared.release.notified().await;
        }

        let channel = match behavior {
            ConnectBehavior::Accept | ConnectBehavior::Hold => {
                let _ = events.send(ChannelEvent::Open);
                Arc::new(MockChannel {
                    shared: Arc::clone(&self.shared),
                    state: RwLock::new(ConnectionState::Open),
                    events: Mutex::new(Some(events)),
                })
            }
            ConnectBehavior::Reject { code } => {
                let _ = events.send(ChannelEvent::Close {
                    code,
                    reason: "rejected".to_string(),
                });
                Arc::new(MockChannel {
                    shared: Arc::clone(&self.shared),
                    state: RwLock::new(ConnectionState::Closed),
                    events: Mutex::new(None),
                })
            }
        };

        self.shared.channels.lock().push(Arc::clone(&channel));
        channel
    }
}

struct MockChannel {
    shared: Arc<Shared>,
    state: RwLock<ConnectionState>,
    events: Mutex<Option<EventSender>>,
}

impl MockChannel {
    fn emit(&self, event: ChannelEvent) -> bool {
        self.events
            .lock()
            .as_ref()
            .is_some_and(|events| events.send(event).is_ok())
    }

    fn terminate(&self, code: u16, reason: &str) {
        *self.state.write() = ConnectionState::Closed;
        if let Some(events) = self.events.lock().take() {
            let _ = events.send(ChannelEvent::Close {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Open {
            return Err(TransportError::NotOpen);
        }
        let frame: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::Send(e.to_string()))?;

        let reply = self
            .shared
            .responder
            .read()
            .clone()
            .and_then(|responder| responder(&frame));

        self.shared.sent.lock().push(frame);
        self.shared.sent_notify.notify_waiters();

        if let Some(reply) = reply {
            self.emit(ChannelEvent::Message(reply.to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.shared.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state() != ConnectionState::Closed {
            self.terminate(1000, "closed locally");
        }
        Ok(())
    }
}

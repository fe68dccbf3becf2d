//! Test helpers for integration tests
//!
//! A local WebSocket endpoint standing in for the orchestration service. It
//! records every connection URI and inbound frame, replies through a
//! configurable responder and can push frames to the newest connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

/// Produces the reply to an inbound frame
pub type Responder = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Acknowledge every request with status 200
pub fn ack(frame: &Value) -> Option<Value> {
    Some(json!({
        "Action": frame["Action"],
        "RequestId": frame["RequestId"],
        "StatusCode": 200,
    }))
}

#[derive(Default)]
struct Recorded {
    uris: Mutex<Vec<String>>,
    frames: Mutex<Vec<Value>>,
    frame_notify: Notify,
    connections: Mutex<Vec<mpsc::UnboundedSender<Message>>>,
    disconnects: AtomicUsize,
}

/// Test endpoint instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    recorded: Arc<Recorded>,
    responder: Arc<RwLock<Responder>>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start an endpoint that accepts every connection
    pub async fn start() -> Result<Self> {
        Self::start_inner(None).await
    }

    /// Start an endpoint that fails every handshake with `status`
    pub async fn start_rejecting(status: u16) -> Result<Self> {
        Self::start_inner(Some(StatusCode::from_u16(status)?)).await
    }

    async fn start_inner(reject: Option<StatusCode>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let recorded = Arc::new(Recorded::default());
        let responder: Arc<RwLock<Responder>> = Arc::new(RwLock::new(Arc::new(ack)));

        let handle = tokio::spawn({
            let recorded = Arc::clone(&recorded);
            let responder = Arc::clone(&responder);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve_connection(
                        stream,
                        reject,
                        Arc::clone(&recorded),
                        Arc::clone(&responder),
                    ));
                }
            }
        });

        Ok(Self {
            addr,
            recorded,
            responder,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        *self.responder.write() = Arc::new(responder);
    }

    /// Request URIs of every handshake, accepted or not
    pub fn uris(&self) -> Vec<String> {
        self.recorded.uris.lock().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.recorded.connections.lock().len()
    }

    pub fn received_actions(&self) -> Vec<String> {
        self.recorded
            .frames
            .lock()
            .iter()
            .filter_map(|frame| frame["Action"].as_str().map(str::to_string))
            .collect()
    }

    /// Send `frame` to the newest connection
    pub fn push(&self, frame: &Value) -> bool {
        self.recorded
            .connections
            .lock()
            .last()
            .is_some_and(|tx| tx.send(Message::text(frame.to_string())).is_ok())
    }

    /// Wait for the `count`-th frame with `action`
    pub async fn wait_for_action(&self, action: &str, count: usize) -> Result<Value> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.recorded.frame_notify.notified();
                let found = self
                    .recorded
                    .frames
                    .lock()
                    .iter()
                    .filter(|frame| frame["Action"] == action)
                    .nth(count.saturating_sub(1))
                    .cloned();
                if let Some(frame) = found {
                    return frame;
                }
                notified.await;
            }
        })
        .await
        .map_err(|_| anyhow!("timed out waiting for {action} #{count}"))
    }

    /// Wait until at least `count` accepted connections have ended
    pub async fn wait_for_disconnects(&self, count: usize) -> Result<()> {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.recorded.disconnects.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| anyhow!("timed out waiting for {count} disconnects"))
    }

    /// Wait until at least `count` connections were accepted
    pub async fn wait_for_connections(&self, count: usize) -> Result<()> {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.connection_count() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| anyhow!("timed out waiting for {count} connections"))
    }
}

async fn serve_connection(
    stream: TcpStream,
    reject: Option<StatusCode>,
    recorded: Arc<Recorded>,
    responder: Arc<RwLock<Responder>>,
) {
    let uri_recorded = Arc::clone(&recorded);
    let callback = move |request: &Request, response: Response| {
        uri_recorded.uris.lock().push(request.uri().to_string());
        match reject {
            Some(status) => {
                let mut rejection = ErrorResponse::new(Some("rejected".to_string()));
                *rejection.status_mut() = status;
                Err(rejection)
            }
            None => Ok(response),
        }
    };

    let Ok(socket) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };
    let (mut sink, mut source) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    recorded.connections.lock().push(tx.clone());

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = source.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<Value>(&text) else {
            tracing::warn!(frame = %text, "Test endpoint received malformed frame");
            continue;
        };

        let reply = (responder.read().clone())(&frame);
        recorded.frames.lock().push(frame);
        recorded.frame_notify.notify_waiters();

        if let Some(reply) = reply {
            let _ = tx.send(Message::text(reply.to_string()));
        }
    }

    recorded.disconnects.fetch_add(1, Ordering::SeqCst);
}

//! Request correlator
//!
//! Turns the multiplexed message channel into call/response pairs. Each
//! request parks a one-shot completion in a map keyed by its request id;
//! whichever of the response or the timeout removes the entry first decides
//! the outcome.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fleetlink_core::{FleetError, FleetResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::connection::MessageSender;
use crate::protocol::{OutboundMessage, ResponsePayload};

/// Default time a request waits for its response
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

struct PendingRequest {
    /// Distinguishes this registration from a later one reusing the id
    ticket: u64,
    created_at: Instant,
    completion: oneshot::Sender<FleetResult<ResponsePayload>>,
}

/// Correlates outbound requests with inbound responses
pub struct RequestCorrelator {
    sender: Arc<dyn MessageSender>,
    pending: DashMap<String, PendingRequest>,
    default_timeout: Duration,
    next_ticket: AtomicU64,
}

impl RequestCorrelator {
    #[must_use]
    pub fn new(sender: Arc<dyn MessageSender>, default_timeout: Duration) -> Self {
        Self {
            sender,
            pending: DashMap::new(),
            default_timeout,
            next_ticket: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn new_shared(sender: Arc<dyn MessageSender>, default_timeout: Duration) -> Arc<Self> {
        Arc::new(Self::new(sender, default_timeout))
    }

    /// Send `message` and wait for its response with the default timeout
    pub async fn send_request(&self, message: OutboundMessage) -> FleetResult<ResponsePayload> {
        self.send_request_with_timeout(message, self.default_timeout)
            .await
    }

    /// Send `message` and wait up to `timeout` for its response.
    ///
    /// Fails immediately with an internal-service error if the request id is
    /// empty or already pending. A failed send removes the registration and
    /// returns the send error without waiting. An expired wait returns
    /// [`FleetError::ConnectTimeout`].
    pub async fn send_request_with_timeout(
        &self,
        message: OutboundMessage,
        timeout: Duration,
    ) -> FleetResult<ResponsePayload> {
        let request_id = message.request_id().to_string();
        if request_id.is_empty() {
            return Err(FleetError::internal(format!(
                "{} request has no request id",
                message.action()
            )));
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (completion, mut rx) = oneshot::channel();

        match self.pending.entry(request_id.clone()) {
            Entry::Occupied(_) => {
                tracing::error!(request_id = %request_id, "Duplicate request id");
                return Err(FleetError::internal(format!(
                    "request id {request_id} is already pending"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingRequest {
                    ticket,
                    created_at: Instant::now(),
                    completion,
                });
            }
        }

        // Releases the registration if this future is dropped mid-wait.
        let guard = PendingGuard {
            pending: &self.pending,
            request_id: &request_id,
            ticket,
        };

        if let Err(e) = self.sender.send_message(&message).await {
            drop(guard);
            return Err(e);
        }

        tracing::debug!(message = %message, "Request sent");

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(FleetError::internal(format!(
                "request {request_id} was abandoned"
            ))),
            Err(_) => {
                if guard.release() {
                    tracing::warn!(
                        message = %message,
                        timeout_ms = timeout.as_millis() as u64,
                        "Request timed out"
                    );
                    return Err(FleetError::ConnectTimeout);
                }
                // The response claimed the entry first; its value is in flight.
                rx.await.unwrap_or_else(|_| {
                    Err(FleetError::internal(format!(
                        "request {request_id} was abandoned"
                    )))
                })
            }
        }
    }

    /// Resolve the pending request `request_id` with `outcome`.
    ///
    /// Returns false if nothing was waiting: an unknown id, a duplicate
    /// response, or a response arriving after the timeout.
    pub fn handle_response(&self, request_id: &str, outcome: FleetResult<ResponsePayload>) -> bool {
        let Some((_, pending)) = self.pending.remove(request_id) else {
            tracing::debug!(request_id = %request_id, "No pending request for response");
            return false;
        };

        tracing::debug!(
            request_id = %request_id,
            elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
            success = outcome.is_ok(),
            "Response received"
        );
        pending.completion.send(outcome).is_ok()
    }

    /// Number of requests waiting for a response
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, request_id: &str) -> bool {
        self.pending.contains_key(request_id)
    }
}

/// Removes a registration unless the response already did
struct PendingGuard<'a> {
    pending: &'a DashMap<String, PendingRequest>,
    request_id: &'a str,
    ticket: u64,
}

impl PendingGuard<'_> {
    /// Remove our registration; true if it was still there
    fn release(&self) -> bool {
        self.pending
            .remove_if(self.request_id, |_, pending| pending.ticket == self.ticket)
            .is_some()
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

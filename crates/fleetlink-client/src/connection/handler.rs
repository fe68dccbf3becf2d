//! Seams between the connection and the layers above it

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetlink_core::{FleetResult, GameSession, UpdateGameSession};

use crate::protocol::{OutboundMessage, ResponsePayload};

/// Receives demultiplexed inbound frames.
///
/// Called from the inbound dispatch task, so implementations must not block.
pub trait MessageHandler: Send + Sync {
    /// A response (success or failure) to a correlated request
    fn on_response(&self, request_id: &str, outcome: FleetResult<ResponsePayload>);

    fn on_start_game_session(&self, game_session: GameSession);

    fn on_update_game_session(&self, update: UpdateGameSession);

    fn on_terminate_process(&self, termination_time: Option<DateTime<Utc>>);

    /// The service asks the process to reconnect to a new endpoint
    fn on_refresh_connection(&self, endpoint: String, auth_token: String);
}

/// Writes one outbound message to the live connection
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage) -> FleetResult<()>;
}

//! Wire protocol definitions
//!
//! Action names, close codes, and the outbound/inbound message formats.

mod actions;
mod close_codes;
mod inbound;
mod outbound;

pub use actions::Action;
pub use close_codes::CloseCode;
pub use inbound::{InboundMessage, ResponsePayload};
pub use outbound::{
    new_request_id, ActivateGameSession, ActivateServerProcess, Envelope, HeartbeatServerProcess,
    NoBody, OutboundMessage, PlayerSessionRef, UpdatePlayerSessionCreationPolicy,
};

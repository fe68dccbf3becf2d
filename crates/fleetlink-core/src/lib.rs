//! # fleetlink-core
//!
//! Domain layer containing game sessions, players, player sessions, the
//! caller-facing request/result types and the error taxonomy.
//! This crate has zero dependencies on infrastructure (runtime, transport, etc.).

pub mod error;
pub mod model;

// Re-export commonly used types at crate root
pub use error::{FleetError, FleetResult};
pub use model::{
    AttributeValue, DescribePlayerSessionsRequest, DescribePlayerSessionsResult, GameSession,
    GetComputeCertificateResult, GetFleetRoleCredentialsRequest, GetFleetRoleCredentialsResult,
    Player, PlayerSession, PlayerSessionCreationPolicy, PlayerSessionStatus,
    StartMatchBackfillRequest, StartMatchBackfillResult, StopMatchBackfillRequest,
    UpdateGameSession, UpdateReason, MAX_PLAYER_SESSIONS,
};

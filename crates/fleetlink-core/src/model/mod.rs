//! Domain model - game sessions, players and the request/result types

use serde::{Deserialize, Deserializer};

mod game_session;
mod player;
mod player_session;
mod requests;
mod results;

pub use game_session::{GameSession, UpdateGameSession, UpdateReason};
pub use player::{AttributeValue, Player};
pub use player_session::{PlayerSession, PlayerSessionCreationPolicy, PlayerSessionStatus};
pub use requests::{
    DescribePlayerSessionsRequest, GetFleetRoleCredentialsRequest, StartMatchBackfillRequest,
    StopMatchBackfillRequest,
};
pub use results::{
    DescribePlayerSessionsResult, GetComputeCertificateResult, GetFleetRoleCredentialsResult,
    StartMatchBackfillResult, MAX_PLAYER_SESSIONS,
};

/// Treat an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

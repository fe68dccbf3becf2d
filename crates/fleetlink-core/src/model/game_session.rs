//! Game session entity - one match hosted by this process

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::null_as_default;

/// A game session assigned to this process by the orchestration service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameSession {
    #[serde(deserialize_with = "null_as_default")]
    pub game_session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Filled in locally from the fleet this process registered with
    #[serde(deserialize_with = "null_as_default")]
    pub fleet_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub maximum_player_session_count: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub port: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchmaker_data: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub game_properties: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

impl GameSession {
    /// Create a session carrying only its id
    #[must_use]
    pub fn new(game_session_id: impl Into<String>) -> Self {
        Self {
            game_session_id: game_session_id.into(),
            ..Self::default()
        }
    }
}

/// Why the service pushed a session update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateReason {
    MatchmakingDataUpdated,
    BackfillFailed,
    BackfillTimedOut,
    BackfillCancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl UpdateReason {
    /// Map a wire name to a reason; unrecognised names become `Unknown`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "MATCHMAKING_DATA_UPDATED" => Self::MatchmakingDataUpdated,
            "BACKFILL_FAILED" => Self::BackfillFailed,
            "BACKFILL_TIMED_OUT" => Self::BackfillTimedOut,
            "BACKFILL_CANCELLED" => Self::BackfillCancelled,
            _ => Self::Unknown,
        }
    }

    /// Wire name of this reason
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MatchmakingDataUpdated => "MATCHMAKING_DATA_UPDATED",
            Self::BackfillFailed => "BACKFILL_FAILED",
            Self::BackfillTimedOut => "BACKFILL_TIMED_OUT",
            Self::BackfillCancelled => "BACKFILL_CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A session update delivered to the update callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGameSession {
    pub game_session: GameSession,
    pub update_reason: UpdateReason,
    pub backfill_ticket_id: Option<String>,
}

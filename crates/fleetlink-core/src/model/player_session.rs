//! Player session entity and its enum mappings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::null_as_default;

/// Lifecycle status of a player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerSessionStatus {
    Reserved,
    Active,
    Completed,
    Timedout,
    #[default]
    #[serde(other)]
    NotSet,
}

impl PlayerSessionStatus {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "RESERVED" => Self::Reserved,
            "ACTIVE" => Self::Active,
            "COMPLETED" => Self::Completed,
            "TIMEDOUT" => Self::Timedout,
            _ => Self::NotSet,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotSet => "NOT_SET",
            Self::Reserved => "RESERVED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Timedout => "TIMEDOUT",
        }
    }
}

impl fmt::Display for PlayerSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a game session accepts new player sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerSessionCreationPolicy {
    AcceptAll,
    DenyAll,
    #[default]
    #[serde(other)]
    NotSet,
}

impl PlayerSessionCreationPolicy {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "ACCEPT_ALL" => Self::AcceptAll,
            "DENY_ALL" => Self::DenyAll,
            _ => Self::NotSet,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotSet => "NOT_SET",
            Self::AcceptAll => "ACCEPT_ALL",
            Self::DenyAll => "DENY_ALL",
        }
    }
}

impl fmt::Display for PlayerSessionCreationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One player's reservation within a game session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PlayerSession {
    #[serde(deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub player_session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub game_session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fleet_id: String,
    pub ip_address: Option<String>,
    pub dns_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub port: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub status: PlayerSessionStatus,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub termination_time: Option<DateTime<Utc>>,
    pub player_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PlayerSessionStatus::from_name("ACTIVE"), PlayerSessionStatus::Active);
        assert_eq!(PlayerSessionStatus::from_name("bogus"), PlayerSessionStatus::NotSet);
        assert_eq!(PlayerSessionStatus::Timedout.name(), "TIMEDOUT");
    }

    #[test]
    fn test_unknown_status_deserializes_as_not_set() {
        let parsed: PlayerSessionStatus = serde_json::from_str("\"EVICTED\"").unwrap();
        assert_eq!(parsed, PlayerSessionStatus::NotSet);
        assert_eq!(PlayerSessionStatus::default(), PlayerSessionStatus::NotSet);

        let parsed: PlayerSessionStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, PlayerSessionStatus::Completed);
    }

    #[test]
    fn test_creation_policy_mapping() {
        assert_eq!(
            PlayerSessionCreationPolicy::from_name("DENY_ALL"),
            PlayerSessionCreationPolicy::DenyAll
        );
        assert_eq!(
            serde_json::to_string(&PlayerSessionCreationPolicy::AcceptAll).unwrap(),
            "\"ACCEPT_ALL\""
        );
        let parsed: PlayerSessionCreationPolicy = serde_json::from_str("\"OPEN\"").unwrap();
        assert_eq!(parsed, PlayerSessionCreationPolicy::NotSet);
    }

    #[test]
    fn test_player_session_parsing() {
        let session: PlayerSession = serde_json::from_str(
            r#"{
                "PlayerId": "player-1",
                "PlayerSessionId": "psess-1",
                "GameSessionId": "gsess-1",
                "FleetId": "fleet-1",
                "Port": 7777,
                "Status": "RESERVED",
                "CreationTime": 1700000000000,
                "TerminationTime": null
            }"#,
        )
        .unwrap();

        assert_eq!(session.player_session_id, "psess-1");
        assert_eq!(session.status, PlayerSessionStatus::Reserved);
        assert_eq!(
            session.creation_time.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert!(session.termination_time.is_none());
        assert!(session.player_data.is_none());
    }
}

//! Caller-facing request types
//!
//! Field names serialize as they appear on the wire, so the protocol layer
//! can embed these directly into outbound messages.

use serde::Serialize;

use super::{Player, PlayerSessionStatus};

/// Query for player sessions; at least one of the three ids must be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribePlayerSessionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_session_status_filter: Option<PlayerSessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl DescribePlayerSessionsRequest {
    #[must_use]
    pub fn for_game_session(game_session_id: impl Into<String>) -> Self {
        Self {
            game_session_id: Some(game_session_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_player_session(player_session_id: impl Into<String>) -> Self {
        Self {
            player_session_id: Some(player_session_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_player(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
            ..Self::default()
        }
    }

    /// True when any of the game session, player session or player id is set
    #[must_use]
    pub fn has_target(&self) -> bool {
        [
            &self.game_session_id,
            &self.player_session_id,
            &self.player_id,
        ]
        .iter()
        .any(|id| id.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Ask the matchmaker to fill open slots in a running session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartMatchBackfillRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub game_session_arn: String,
    pub matchmaking_configuration_arn: String,
    pub players: Vec<Player>,
}

/// Cancel a backfill ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopMatchBackfillRequest {
    pub game_session_arn: String,
    pub matchmaking_configuration_arn: String,
    pub ticket_id: String,
}

/// Fetch short-lived credentials for an IAM role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetFleetRoleCredentialsRequest {
    pub role_arn: String,
    /// Defaults to `{fleetId}-{hostId}` when not supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_session_name: Option<String>,
}

impl GetFleetRoleCredentialsRequest {
    #[must_use]
    pub fn new(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            role_session_name: None,
        }
    }

    #[must_use]
    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_has_target() {
        assert!(!DescribePlayerSessionsRequest::default().has_target());
        assert!(DescribePlayerSessionsRequest::for_player("p").has_target());
        assert!(DescribePlayerSessionsRequest::for_game_session("g").has_target());

        let blank = DescribePlayerSessionsRequest {
            player_session_id: Some(String::new()),
            ..Default::default()
        };
        assert!(!blank.has_target());
    }

    #[test]
    fn test_describe_serialization_skips_unset_fields() {
        let request = DescribePlayerSessionsRequest {
            player_session_status_filter: Some(PlayerSessionStatus::Active),
            limit: Some(10),
            ..DescribePlayerSessionsRequest::for_game_session("gsess-1")
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["GameSessionId"], "gsess-1");
        assert_eq!(value["PlayerSessionStatusFilter"], "ACTIVE");
        assert_eq!(value["Limit"], 10);
        assert!(value.get("PlayerId").is_none());
        assert!(value.get("NextToken").is_none());
    }
}

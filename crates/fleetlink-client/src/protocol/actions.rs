//! Message actions
//!
//! Every frame carries an `Action` string selecting its handler.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Outbound requests
    ActivateServerProcess,
    TerminateServerProcess,
    ActivateGameSession,
    UpdatePlayerSessionCreationPolicy,
    AcceptPlayerSession,
    RemovePlayerSession,
    HeartbeatServerProcess,
    StopMatchBackfill,
    // Requests whose responses carry a payload
    StartMatchBackfill,
    DescribePlayerSessions,
    GetComputeCertificate,
    GetFleetRoleCredentials,
    // Service-pushed events
    CreateGameSession,
    UpdateGameSession,
    TerminateProcess,
    RefreshConnection,
}

impl Action {
    /// Parse an action name; unknown names return `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name {
            "ActivateServerProcess" => Self::ActivateServerProcess,
            "TerminateServerProcess" => Self::TerminateServerProcess,
            "ActivateGameSession" => Self::ActivateGameSession,
            "UpdatePlayerSessionCreationPolicy" => Self::UpdatePlayerSessionCreationPolicy,
            "AcceptPlayerSession" => Self::AcceptPlayerSession,
            "RemovePlayerSession" => Self::RemovePlayerSession,
            "HeartbeatServerProcess" => Self::HeartbeatServerProcess,
            "StopMatchBackfill" => Self::StopMatchBackfill,
            "StartMatchBackfill" => Self::StartMatchBackfill,
            "DescribePlayerSessions" => Self::DescribePlayerSessions,
            "GetComputeCertificate" => Self::GetComputeCertificate,
            "GetFleetRoleCredentials" => Self::GetFleetRoleCredentials,
            "CreateGameSession" => Self::CreateGameSession,
            "UpdateGameSession" => Self::UpdateGameSession,
            "TerminateProcess" => Self::TerminateProcess,
            "RefreshConnection" => Self::RefreshConnection,
            _ => return None,
        };
        Some(action)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActivateServerProcess => "ActivateServerProcess",
            Self::TerminateServerProcess => "TerminateServerProcess",
            Self::ActivateGameSession => "ActivateGameSession",
            Self::UpdatePlayerSessionCreationPolicy => "UpdatePlayerSessionCreationPolicy",
            Self::AcceptPlayerSession => "AcceptPlayerSession",
            Self::RemovePlayerSession => "RemovePlayerSession",
            Self::HeartbeatServerProcess => "HeartbeatServerProcess",
            Self::StopMatchBackfill => "StopMatchBackfill",
            Self::StartMatchBackfill => "StartMatchBackfill",
            Self::DescribePlayerSessions => "DescribePlayerSessions",
            Self::GetComputeCertificate => "GetComputeCertificate",
            Self::GetFleetRoleCredentials => "GetFleetRoleCredentials",
            Self::CreateGameSession => "CreateGameSession",
            Self::UpdateGameSession => "UpdateGameSession",
            Self::TerminateProcess => "TerminateProcess",
            Self::RefreshConnection => "RefreshConnection",
        }
    }

    /// Pushed by the service rather than sent in reply to a request
    #[must_use]
    pub const fn is_event(self) -> bool {
        matches!(
            self,
            Self::CreateGameSession
                | Self::UpdateGameSession
                | Self::TerminateProcess
                | Self::RefreshConnection
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for action in [
            Action::ActivateServerProcess,
            Action::GetFleetRoleCredentials,
            Action::RefreshConnection,
            Action::UpdatePlayerSessionCreationPolicy,
        ] {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("Unknown"), None);
        assert_eq!(Action::parse("createGameSession"), None);
    }

    #[test]
    fn test_is_event() {
        assert!(Action::CreateGameSession.is_event());
        assert!(Action::RefreshConnection.is_event());
        assert!(!Action::StartMatchBackfill.is_event());
        assert!(!Action::HeartbeatServerProcess.is_event());
    }
}

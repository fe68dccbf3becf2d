//! Outbound messages
//!
//! Every request is an `Envelope` (the `RequestId` plus a flattened body)
//! tagged with its `Action`.

use fleetlink_core::{
    DescribePlayerSessionsRequest, GetFleetRoleCredentialsRequest, PlayerSessionCreationPolicy,
    StartMatchBackfillRequest, StopMatchBackfillRequest,
};
use serde::Serialize;
use uuid::Uuid;

use super::Action;

/// Generate a fresh request id
#[must_use]
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Request id plus body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    pub request_id: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wrap `body` under a new random request id
    pub fn new(body: T) -> Self {
        Self::with_request_id(new_request_id(), body)
    }

    pub fn with_request_id(request_id: impl Into<String>, body: T) -> Self {
        Self {
            request_id: request_id.into(),
            body,
        }
    }
}

/// Body of requests that carry nothing but their id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoBody {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateServerProcess {
    pub sdk_version: String,
    pub sdk_language: String,
    pub port: i32,
    pub log_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateGameSession {
    pub game_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePlayerSessionCreationPolicy {
    pub game_session_id: String,
    pub player_session_policy: PlayerSessionCreationPolicy,
}

/// Accept and remove both address one player session of one game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerSessionRef {
    pub game_session_id: String,
    pub player_session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeartbeatServerProcess {
    pub health_status: bool,
}

/// Every request the client sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Action")]
pub enum OutboundMessage {
    ActivateServerProcess(Envelope<ActivateServerProcess>),
    TerminateServerProcess(Envelope<NoBody>),
    ActivateGameSession(Envelope<ActivateGameSession>),
    UpdatePlayerSessionCreationPolicy(Envelope<UpdatePlayerSessionCreationPolicy>),
    AcceptPlayerSession(Envelope<PlayerSessionRef>),
    RemovePlayerSession(Envelope<PlayerSessionRef>),
    DescribePlayerSessions(Envelope<DescribePlayerSessionsRequest>),
    StartMatchBackfill(Envelope<StartMatchBackfillRequest>),
    StopMatchBackfill(Envelope<StopMatchBackfillRequest>),
    HeartbeatServerProcess(Envelope<HeartbeatServerProcess>),
    GetComputeCertificate(Envelope<NoBody>),
    GetFleetRoleCredentials(Envelope<GetFleetRoleCredentialsRequest>),
}

impl OutboundMessage {
    // === Constructors ===

    #[must_use]
    pub fn activate_server_process(
        sdk_version: &str,
        sdk_language: &str,
        port: i32,
        log_paths: Vec<String>,
    ) -> Self {
        Self::ActivateServerProcess(Envelope::new(ActivateServerProcess {
            sdk_version: sdk_version.to_string(),
            sdk_language: sdk_language.to_string(),
            port,
            log_paths,
        }))
    }

    #[must_use]
    pub fn terminate_server_process() -> Self {
        Self::TerminateServerProcess(Envelope::new(NoBody {}))
    }

    #[must_use]
    pub fn activate_game_session(game_session_id: &str) -> Self {
        Self::ActivateGameSession(Envelope::new(ActivateGameSession {
            game_session_id: game_session_id.to_string(),
        }))
    }

    #[must_use]
    pub fn update_player_session_creation_policy(
        game_session_id: &str,
        policy: PlayerSessionCreationPolicy,
    ) -> Self {
        Self::UpdatePlayerSessionCreationPolicy(Envelope::new(UpdatePlayerSessionCreationPolicy {
            game_session_id: game_session_id.to_string(),
            player_session_policy: policy,
        }))
    }

    #[must_use]
    pub fn accept_player_session(game_session_id: &str, player_session_id: &str) -> Self {
        Self::AcceptPlayerSession(Envelope::new(PlayerSessionRef {
            game_session_id: game_session_id.to_string(),
            player_session_id: player_session_id.to_string(),
        }))
    }

    #[must_use]
    pub fn remove_player_session(game_session_id: &str, player_session_id: &str) -> Self {
        Self::RemovePlayerSession(Envelope::new(PlayerSessionRef {
            game_session_id: game_session_id.to_string(),
            player_session_id: player_session_id.to_string(),
        }))
    }

    #[must_use]
    pub fn describe_player_sessions(request: DescribePlayerSessionsRequest) -> Self {
        Self::DescribePlayerSessions(Envelope::new(request))
    }

    #[must_use]
    pub fn start_match_backfill(request: StartMatchBackfillRequest) -> Self {
        Self::StartMatchBackfill(Envelope::new(request))
    }

    #[must_use]
    pub fn stop_match_backfill(request: StopMatchBackfillRequest) -> Self {
        Self::StopMatchBackfill(Envelope::new(request))
    }

    #[must_use]
    pub fn heartbeat(healthy: bool) -> Self {
        Self::HeartbeatServerProcess(Envelope::new(HeartbeatServerProcess {
            health_status: healthy,
        }))
    }

    #[must_use]
    pub fn get_compute_certificate() -> Self {
        Self::GetComputeCertificate(Envelope::new(NoBody {}))
    }

    #[must_use]
    pub fn get_fleet_role_credentials(request: GetFleetRoleCredentialsRequest) -> Self {
        Self::GetFleetRoleCredentials(Envelope::new(request))
    }

    // === Accessors ===

    /// Correlation id of this request
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::ActivateServerProcess(e) => &e.request_id,
            Self::TerminateServerProcess(e) | Self::GetComputeCertificate(e) => &e.request_id,
            Self::ActivateGameSession(e) => &e.request_id,
            Self::UpdatePlayerSessionCreationPolicy(e) => &e.request_id,
            Self::AcceptPlayerSession(e) | Self::RemovePlayerSession(e) => &e.request_id,
            Self::DescribePlayerSessions(e) => &e.request_id,
            Self::StartMatchBackfill(e) => &e.request_id,
            Self::StopMatchBackfill(e) => &e.request_id,
            Self::HeartbeatServerProcess(e) => &e.request_id,
            Self::GetFleetRoleCredentials(e) => &e.request_id,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::ActivateServerProcess(_) => Action::ActivateServerProcess,
            Self::TerminateServerProcess(_) => Action::TerminateServerProcess,
            Self::ActivateGameSession(_) => Action::ActivateGameSession,
            Self::UpdatePlayerSessionCreationPolicy(_) => Action::UpdatePlayerSessionCreationPolicy,
            Self::AcceptPlayerSession(_) => Action::AcceptPlayerSession,
            Self::RemovePlayerSession(_) => Action::RemovePlayerSession,
            Self::DescribePlayerSessions(_) => Action::DescribePlayerSessions,
            Self::StartMatchBackfill(_) => Action::StartMatchBackfill,
            Self::StopMatchBackfill(_) => Action::StopMatchBackfill,
            Self::HeartbeatServerProcess(_) => Action::HeartbeatServerProcess,
            Self::GetComputeCertificate(_) => Action::GetComputeCertificate,
            Self::GetFleetRoleCredentials(_) => Action::GetFleetRoleCredentials,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.action(), self.request_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlink_core::Player;
    use serde_json::{json, Value};

    fn to_value(message: &OutboundMessage) -> Value {
        serde_json::from_str(&message.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_activate_server_process_frame() {
        let message =
            OutboundMessage::activate_server_process("5.3.0", "Rust", 7777, vec!["/logs".into()]);
        let value = to_value(&message);

        assert_eq!(value["Action"], "ActivateServerProcess");
        assert_eq!(value["RequestId"], message.request_id());
        assert_eq!(value["SdkVersion"], "5.3.0");
        assert_eq!(value["SdkLanguage"], "Rust");
        assert_eq!(value["Port"], 7777);
        assert_eq!(value["LogPaths"], json!(["/logs"]));
    }

    #[test]
    fn test_empty_body_frame_has_only_envelope() {
        let message = OutboundMessage::TerminateServerProcess(Envelope::with_request_id(
            "req-1",
            NoBody {},
        ));
        assert_eq!(
            to_value(&message),
            json!({"Action": "TerminateServerProcess", "RequestId": "req-1"})
        );
    }

    #[test]
    fn test_heartbeat_frame() {
        let value = to_value(&OutboundMessage::heartbeat(false));
        assert_eq!(value["Action"], "HeartbeatServerProcess");
        assert_eq!(value["HealthStatus"], false);
    }

    #[test]
    fn test_creation_policy_frame() {
        let value = to_value(&OutboundMessage::update_player_session_creation_policy(
            "gsess-1",
            PlayerSessionCreationPolicy::DenyAll,
        ));
        assert_eq!(value["GameSessionId"], "gsess-1");
        assert_eq!(value["PlayerSessionPolicy"], "DENY_ALL");
    }

    #[test]
    fn test_backfill_frame_embeds_players() {
        let value = to_value(&OutboundMessage::start_match_backfill(StartMatchBackfillRequest {
            ticket_id: None,
            game_session_arn: "arn:session".into(),
            matchmaking_configuration_arn: "arn:config".into(),
            players: vec![Player::new("p1")],
        }));

        assert_eq!(value["Action"], "StartMatchBackfill");
        assert_eq!(value["GameSessionArn"], "arn:session");
        assert_eq!(value["Players"][0]["PlayerId"], "p1");
        assert!(value.get("TicketId").is_none());
    }

    #[test]
    fn test_action_matches_serialized_tag() {
        let messages = [
            OutboundMessage::terminate_server_process(),
            OutboundMessage::accept_player_session("g", "p"),
            OutboundMessage::get_compute_certificate(),
            OutboundMessage::get_fleet_role_credentials(GetFleetRoleCredentialsRequest::new("arn")),
        ];
        for message in &messages {
            assert_eq!(to_value(message)["Action"], message.action().as_str());
        }
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = OutboundMessage::heartbeat(true);
        let b = OutboundMessage::heartbeat(true);
        assert_ne!(a.request_id(), b.request_id());
        assert!(a.to_string().starts_with("HeartbeatServerProcess["));
    }
}

//! Inbound message parsing
//!
//! Every frame is first read as a response envelope. A non-2xx status with a
//! request id is a failed response; otherwise the `Action` picks the shape.

use chrono::{DateTime, Utc};
use fleetlink_core::{
    DescribePlayerSessionsResult, FleetError, FleetResult, GameSession,
    GetComputeCertificateResult, GetFleetRoleCredentialsResult, StartMatchBackfillResult,
    UpdateGameSession, UpdateReason,
};
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use super::Action;

/// Successful response content handed back to the waiting caller
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Plain acknowledgement
    Ack,
    StartMatchBackfill(StartMatchBackfillResult),
    DescribePlayerSessions(DescribePlayerSessionsResult),
    ComputeCertificate(GetComputeCertificateResult),
    FleetRoleCredentials(GetFleetRoleCredentialsResult),
}

impl ResponsePayload {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ack => "Ack",
            Self::StartMatchBackfill(_) => "StartMatchBackfill",
            Self::DescribePlayerSessions(_) => "DescribePlayerSessions",
            Self::ComputeCertificate(_) => "GetComputeCertificate",
            Self::FleetRoleCredentials(_) => "GetFleetRoleCredentials",
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Outcome of a correlated request
    Response {
        request_id: String,
        outcome: FleetResult<ResponsePayload>,
    },
    CreateGameSession(GameSession),
    UpdateGameSession(UpdateGameSession),
    TerminateProcess {
        termination_time: Option<DateTime<Utc>>,
    },
    RefreshConnection {
        endpoint: String,
        auth_token: String,
    },
    /// Frame with no request id and no event meaning
    Unsolicited { action: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseEnvelope {
    action: Option<String>,
    request_id: Option<String>,
    status_code: Option<u16>,
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreateGameSessionMessage {
    game_session_id: Option<String>,
    game_session_name: Option<String>,
    maximum_player_session_count: Option<i32>,
    port: Option<i32>,
    ip_address: Option<String>,
    game_session_data: Option<String>,
    matchmaker_data: Option<String>,
    game_properties: Option<std::collections::HashMap<String, String>>,
    dns_name: Option<String>,
}

impl From<CreateGameSessionMessage> for GameSession {
    fn from(message: CreateGameSessionMessage) -> Self {
        Self {
            game_session_id: message.game_session_id.unwrap_or_default(),
            name: message.game_session_name,
            fleet_id: String::new(),
            maximum_player_session_count: message.maximum_player_session_count.unwrap_or_default(),
            port: message.port.unwrap_or_default(),
            ip_address: message.ip_address,
            game_session_data: message.game_session_data,
            matchmaker_data: message.matchmaker_data,
            game_properties: message.game_properties.unwrap_or_default(),
            dns_name: message.dns_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct UpdateGameSessionMessage {
    game_session: Option<GameSession>,
    update_reason: Option<String>,
    backfill_ticket_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct TerminateProcessMessage {
    termination_time: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RefreshConnectionMessage {
    refresh_connection_endpoint: Option<String>,
    auth_token: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl InboundMessage {
    /// Decode one text frame
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let envelope = ResponseEnvelope::deserialize(&value)?;
        let request_id = non_empty(envelope.request_id);

        if let (Some(status), Some(request_id)) = (envelope.status_code, request_id.as_ref()) {
            if !is_success(status) {
                return Ok(Self::Response {
                    request_id: request_id.clone(),
                    outcome: Err(FleetError::from_status_code(status, envelope.error_message)),
                });
            }
        }

        let action_name = envelope.action.unwrap_or_default();
        let payload = match Action::parse(&action_name) {
            Some(Action::CreateGameSession) => {
                let message = CreateGameSessionMessage::deserialize(&value)?;
                if non_empty(message.game_session_id.clone()).is_none() {
                    return Err(serde_json::Error::custom("CreateGameSession without GameSessionId"));
                }
                return Ok(Self::CreateGameSession(message.into()));
            }
            Some(Action::UpdateGameSession) => {
                let message = UpdateGameSessionMessage::deserialize(&value)?;
                return Ok(Self::UpdateGameSession(UpdateGameSession {
                    game_session: message.game_session.unwrap_or_default(),
                    update_reason: message
                        .update_reason
                        .as_deref()
                        .map_or(UpdateReason::Unknown, UpdateReason::from_name),
                    backfill_ticket_id: non_empty(message.backfill_ticket_id),
                }));
            }
            Some(Action::TerminateProcess) => {
                let message = TerminateProcessMessage::deserialize(&value)?;
                return Ok(Self::TerminateProcess {
                    termination_time: message
                        .termination_time
                        .and_then(DateTime::from_timestamp_millis),
                });
            }
            Some(Action::RefreshConnection) => {
                let message = RefreshConnectionMessage::deserialize(&value)?;
                return match (
                    non_empty(message.refresh_connection_endpoint),
                    non_empty(message.auth_token),
                ) {
                    (Some(endpoint), Some(auth_token)) => Ok(Self::RefreshConnection {
                        endpoint,
                        auth_token,
                    }),
                    _ => Err(serde_json::Error::custom(
                        "RefreshConnection without endpoint or token",
                    )),
                };
            }
            Some(Action::StartMatchBackfill) => {
                ResponsePayload::StartMatchBackfill(StartMatchBackfillResult::deserialize(&value)?)
            }
            Some(Action::DescribePlayerSessions) => ResponsePayload::DescribePlayerSessions(
                DescribePlayerSessionsResult::deserialize(&value)?.capped(),
            ),
            Some(Action::GetComputeCertificate) => ResponsePayload::ComputeCertificate(
                GetComputeCertificateResult::deserialize(&value)?,
            ),
            Some(Action::GetFleetRoleCredentials) => ResponsePayload::FleetRoleCredentials(
                GetFleetRoleCredentialsResult::deserialize(&value)?,
            ),
            _ => ResponsePayload::Ack,
        };

        Ok(match request_id {
            Some(request_id) => Self::Response {
                request_id,
                outcome: Ok(payload),
            },
            None => Self::Unsolicited {
                action: action_name,
            },
        })
    }
}

//! Results returned by correlated requests

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, PlayerSession};

/// Upper bound on player sessions kept from one describe response
pub const MAX_PLAYER_SESSIONS: usize = 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StartMatchBackfillResult {
    #[serde(deserialize_with = "null_as_default")]
    pub ticket_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DescribePlayerSessionsResult {
    pub next_token: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub player_sessions: Vec<PlayerSession>,
}

impl DescribePlayerSessionsResult {
    /// Drop player sessions beyond [`MAX_PLAYER_SESSIONS`]
    #[must_use]
    pub fn capped(mut self) -> Self {
        self.player_sessions.truncate(MAX_PLAYER_SESSIONS);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetComputeCertificateResult {
    #[serde(deserialize_with = "null_as_default")]
    pub certificate_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub compute_name: String,
}

/// Short-lived role credentials
///
/// An empty `access_key_id` means the process is not running on managed
/// infrastructure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetFleetRoleCredentialsResult {
    #[serde(deserialize_with = "null_as_default")]
    pub assumed_role_user_arn: String,
    #[serde(deserialize_with = "null_as_default")]
    pub assumed_role_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub access_key_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub secret_access_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub session_token: String,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub expiration: Option<DateTime<Utc>>,
}

impl GetFleetRoleCredentialsResult {
    /// True if the credentials stay valid for longer than `window` after `now`
    #[must_use]
    pub fn is_valid_beyond(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.expiration
            .is_some_and(|expiration| expiration - window > now)
    }
}

impl std::fmt::Debug for GetFleetRoleCredentialsResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetFleetRoleCredentialsResult")
            .field("assumed_role_user_arn", &self.assumed_role_user_arn)
            .field("assumed_role_id", &self.assumed_role_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

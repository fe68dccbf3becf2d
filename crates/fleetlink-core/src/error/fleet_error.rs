//! Fleet errors - the outcome of every failed public operation
//!
//! Each variant is one error kind the orchestration service or the client
//! itself can produce. Errors never escape as panics; they are returned.

use thiserror::Error;

/// Result alias used by every public operation
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors surfaced to callers of the fleet client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    // =========================================================================
    // Precondition Errors
    // =========================================================================
    #[error("No game sessions are bound to this process")]
    GameSessionIdNotSet,

    #[error("Termination time is not set because a game session has not started")]
    TerminationTimeNotSet,

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Service call failed: {0}")]
    ServiceCallFailed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal service error: {0}")]
    InternalService(String),

    // =========================================================================
    // Connection Errors
    // =========================================================================
    #[error("Connection to the fleet service WebSocket has failed")]
    ConnectFailure,

    #[error("Connection to the fleet service WebSocket is denied, check the authentication token")]
    ConnectForbidden,

    #[error("Connection to the fleet service WebSocket has timed out")]
    ConnectTimeout,
}

impl FleetError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal service error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalService(message.into())
    }

    /// Create a service call failed error
    pub fn service_call_failed(message: impl Into<String>) -> Self {
        Self::ServiceCallFailed(message.into())
    }

    /// Classify a non-success status code returned by the service.
    ///
    /// 4xx becomes a bad request, everything else an internal service error.
    pub fn from_status_code(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("service returned status {status}"));
        if (400..500).contains(&status) {
            Self::BadRequest(message)
        } else {
            Self::InternalService(message)
        }
    }

    /// Stable error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::GameSessionIdNotSet => "GAMESESSION_ID_NOT_SET",
            Self::TerminationTimeNotSet => "TERMINATION_TIME_NOT_SET",
            Self::ServiceCallFailed(_) => "SERVICE_CALL_FAILED",
            Self::BadRequest(_) => "BAD_REQUEST_EXCEPTION",
            Self::InternalService(_) => "INTERNAL_SERVICE_EXCEPTION",
            Self::ConnectFailure => "WEBSOCKET_CONNECT_FAILURE",
            Self::ConnectForbidden => "WEBSOCKET_CONNECT_FAILURE_FORBIDDEN",
            Self::ConnectTimeout => "WEBSOCKET_CONNECT_FAILURE_TIMEOUT",
        }
    }

    /// Check if this error came from establishing (or waiting on) the connection
    #[must_use]
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailure | Self::ConnectForbidden | Self::ConnectTimeout
        )
    }

    /// Check if the caller can fix this error by changing its input or call order
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::GameSessionIdNotSet | Self::TerminationTimeNotSet | Self::BadRequest(_)
        )
    }
}

//! WebSocket close codes
//!
//! RFC 6455 close codes and how each one classifies a failed connect.

use fleetlink_core::FleetError;

/// Close codes the orchestration endpoint (or the local transport) reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure
    Normal = 1000,
    /// Endpoint going away
    GoingAway = 1001,
    /// Protocol error; the service uses it to reject credentials
    ProtocolError = 1002,
    /// Unsupported data
    Unsupported = 1003,
    /// No status code was present
    NoStatus = 1005,
    /// Connection dropped without a close frame
    Abnormal = 1006,
    /// Payload was not consistent with the message type
    InvalidPayload = 1007,
    /// Policy violation
    PolicyViolation = 1008,
    /// Message too big
    MessageTooBig = 1009,
    /// Server hit an unexpected condition
    InternalError = 1011,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1002 => Some(Self::ProtocolError),
            1003 => Some(Self::Unsupported),
            1005 => Some(Self::NoStatus),
            1006 => Some(Self::Abnormal),
            1007 => Some(Self::InvalidPayload),
            1008 => Some(Self::PolicyViolation),
            1009 => Some(Self::MessageTooBig),
            1011 => Some(Self::InternalError),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Error a connect attempt that ended with `code` resolves to
    #[must_use]
    pub fn classify(code: u16) -> FleetError {
        match Self::from_u16(code) {
            Some(Self::ProtocolError) => FleetError::ConnectForbidden,
            Some(Self::Abnormal) => FleetError::ConnectTimeout,
            _ => FleetError::ConnectFailure,
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::GoingAway => "GoingAway",
            Self::ProtocolError => "ProtocolError",
            Self::Unsupported => "Unsupported",
            Self::NoStatus => "NoStatus",
            Self::Abnormal => "Abnormal",
            Self::InvalidPayload => "InvalidPayload",
            Self::PolicyViolation => "PolicyViolation",
            Self::MessageTooBig => "MessageTooBig",
            Self::InternalError => "InternalError",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_from_u16() {
        assert_eq!(CloseCode::from_u16(1000), Some(CloseCode::Normal));
        assert_eq!(CloseCode::from_u16(1002), Some(CloseCode::ProtocolError));
        assert_eq!(CloseCode::from_u16(1006), Some(CloseCode::Abnormal));
        assert_eq!(CloseCode::from_u16(1004), None);
        assert_eq!(CloseCode::from_u16(4000), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(CloseCode::classify(1002), FleetError::ConnectForbidden);
        assert_eq!(CloseCode::classify(1006), FleetError::ConnectTimeout);
        assert_eq!(CloseCode::classify(1000), FleetError::ConnectFailure);
        assert_eq!(CloseCode::classify(1011), FleetError::ConnectFailure);
        assert_eq!(CloseCode::classify(4321), FleetError::ConnectFailure);
    }

    #[test]
    fn test_close_code_display() {
        let display = CloseCode::ProtocolError.to_string();
        assert!(display.contains("1002"));
        assert!(display.contains("ProtocolError"));
    }
}

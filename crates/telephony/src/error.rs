//! Telephony error types

use thiserror::Error;

use crate::call::CallStatus;

/// Errors raised by transports, call systems and meeting systems
#[derive(Debug, Clone, Error)]
pub enum TelephonyError {
    /// Could not reach the remote side
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation on a closed connection or transport
    #[error("Connection closed")]
    Closed,

    /// Invalid configuration or options
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// DTMF digits outside `0-9`, `*`, `#`, `A-D`
    #[error("Invalid DTMF digits: {0}")]
    InvalidDtmf(String),

    /// Call status change the lifecycle does not allow
    #[error("Invalid call transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: CallStatus,
        /// Requested status
        to: CallStatus,
    },

    /// No call with this identifier
    #[error("Call not found: {0}")]
    CallNotFound(String),

    /// No meeting with this identifier
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    /// An agent session is already attached
    #[error("Agent session already attached: {0}")]
    AgentAlreadyAttached(String),

    /// No agent session is attached
    #[error("No agent session attached")]
    NoAgentAttached,

    /// The agent session failed to start or stop
    #[error("Agent session failed: {0}")]
    AgentFailed(String),

    /// The platform does not offer this operation
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Error reported by the platform
    #[error("Platform error: {0}")]
    Platform(String),
}

impl TelephonyError {
    /// Whether the call or connection can no longer be used
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::CallNotFound(_) | Self::MeetingNotFound(_)
        )
    }
}

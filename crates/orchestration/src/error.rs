//! Client error types

use speech::SpeechError;
use thiserror::Error;

use crate::capability::Modality;
use crate::context::CancelReason;
use crate::report::AttemptReport;

/// Errors surfaced by the orchestration clients
///
/// Individual provider failures never appear here directly; they are kept
/// in the [`AttemptReport`] attached to the top-level kind.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Every candidate was absent, skipped or failed
    #[error("No available {modality} provider ({report})")]
    NoAvailableProvider {
        /// Client modality
        modality: Modality,
        /// What happened to each candidate
        report: AttemptReport,
    },

    /// No candidate in the ordering offers the required streaming tier
    #[error("Streaming not supported by any {0} provider")]
    StreamingNotSupported(Modality),

    /// Caller cancelled or deadline expired while falling back
    #[error("{modality} request {reason} ({report})")]
    Cancelled {
        /// Client modality
        modality: Modality,
        /// Cancellation or deadline
        reason: CancelReason,
        /// Attempts made before the request was abandoned
        report: AttemptReport,
    },

    /// The provider serving an established stream failed
    #[error("{modality} stream from provider '{provider}' failed: {source}")]
    StreamFailed {
        /// Client modality
        modality: Modality,
        /// Provider that owned the session
        provider: String,
        /// Provider error
        source: SpeechError,
    },

    /// Name does not resolve in the registry
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Every candidate reported the voice as missing
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Provider registration rejected
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ClientError {
    /// Diagnostics for the request, if any candidates were considered
    #[must_use]
    pub const fn report(&self) -> Option<&AttemptReport> {
        match self {
            Self::NoAvailableProvider { report, .. } | Self::Cancelled { report, .. } => {
                Some(report)
            }
            _ => None,
        }
    }

    /// Whether the caller gave up on the request
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors from building a provider registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Provider reported an empty name
    #[error("Provider name must not be empty")]
    EmptyName,

    /// Another provider is registered under the same name
    #[error("Provider '{0}' is already registered")]
    Duplicate(String),
}

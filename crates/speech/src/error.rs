//! Speech provider errors

use thiserror::Error;

/// Errors a speech provider can report
///
/// This is the vocabulary adapters use to describe a failed call. The
/// orchestration layer records these for diagnostics; it never hands them
/// back as the primary failure of a batch request.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// Failed to connect to speech service
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to speech service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Invalid audio format or corrupted data
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Request configuration rejected by the provider
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Audio too long for processing
    #[error("Audio too long: {duration_ms}ms exceeds maximum of {max_ms}ms")]
    AudioTooLong {
        /// Duration of the provided audio
        duration_ms: u64,
        /// Maximum allowed duration
        max_ms: u64,
    },

    /// Audio too short to transcribe
    #[error("Audio too short: {duration_ms}ms is below minimum of {min_ms}ms")]
    AudioTooShort {
        /// Duration of the provided audio
        duration_ms: u64,
        /// Minimum accepted duration
        min_ms: u64,
    },

    /// Transcription failed
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Timeout during processing
    #[error("Speech processing timeout after {0}ms")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider quota exhausted
    #[error("Quota exceeded")]
    QuotaExceeded,

    /// Language not supported by the provider
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Audio format not supported by the provider
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Input kind (file, URL, ...) not accepted by the provider
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Voice not found
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Provider does not implement streaming
    #[error("Streaming not supported by provider: {0}")]
    StreamingNotSupported(String),

    /// Write or read on a stream that was already closed
    #[error("Stream closed")]
    StreamClosed,

    /// Service unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl SpeechError {
    /// Whether retrying the same request later could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RateLimited
                | Self::QuotaExceeded
                | Self::ServiceUnavailable(_)
        )
    }

    /// Whether the failure is caused by the request itself
    ///
    /// Such failures reproduce on every provider: malformed audio stays
    /// malformed no matter who decodes it.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAudio(_) | Self::InvalidConfig(_) | Self::AudioTooShort { .. }
        )
    }
}

impl From<std::io::Error> for SpeechError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::InvalidAudio(format!("file not found: {err}")),
            std::io::ErrorKind::BrokenPipe => Self::StreamClosed,
            _ => Self::RequestFailed(err.to_string()),
        }
    }
}

//! Audio transport ports
//!
//! A [`Transport`] produces [`Connection`]s: bidirectional audio byte
//! streams with a side channel of [`TransportEvent`]s. WebRTC, SIP and
//! WebSocket adapters implement these traits outside this workspace.

use std::fmt;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::TelephonyError;

/// Audio received from the remote party
pub type AudioByteStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// Side-channel events of one connection
pub type TransportEventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Incoming connections accepted by a listening transport
pub type ConnectionStream = Pin<Box<dyn Stream<Item = Arc<dyn Connection>> + Send>>;

/// Audio encoding on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportEncoding {
    /// 16-bit linear PCM
    #[default]
    Pcm,
    /// Opus (variable bitrate)
    Opus,
    /// G.711 (8-bit companded)
    G711,
}

impl TransportEncoding {
    /// Bytes per sample per channel, `None` for variable-rate codecs
    #[must_use]
    pub const fn bytes_per_sample(self) -> Option<u32> {
        match self {
            Self::Pcm => Some(2),
            Self::G711 => Some(1),
            Self::Opus => None,
        }
    }
}

impl fmt::Display for TransportEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcm => write!(f, "pcm"),
            Self::Opus => write!(f, "opus"),
            Self::G711 => write!(f, "g711"),
        }
    }
}

/// Connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: u16,
    /// Wire encoding
    pub encoding: TransportEncoding,
    /// Audio buffer size in milliseconds
    pub buffer_size_ms: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            encoding: TransportEncoding::Pcm,
            buffer_size_ms: 20,
        }
    }
}

impl TransportConfig {
    /// Narrowband telephony: 8 kHz mono G.711
    #[must_use]
    pub fn telephony() -> Self {
        Self {
            sample_rate: 8_000,
            encoding: TransportEncoding::G711,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 || self.sample_rate > 192_000 {
            return Err(format!("sample_rate {} out of range", self.sample_rate));
        }
        if !(1..=8).contains(&self.channels) {
            return Err(format!("channels must be 1-8, got {}", self.channels));
        }
        if !(1..=1_000).contains(&self.buffer_size_ms) {
            return Err(format!(
                "buffer_size_ms must be 1-1000, got {}",
                self.buffer_size_ms
            ));
        }
        Ok(())
    }

    /// Size of one buffer in bytes, `None` for variable-rate encodings
    #[must_use]
    pub fn frame_bytes(&self) -> Option<usize> {
        let per_sample = self.encoding.bytes_per_sample()?;
        let samples = u64::from(self.sample_rate) * u64::from(self.buffer_size_ms) / 1_000;
        let bytes = samples * u64::from(self.channels) * u64::from(per_sample);
        usize::try_from(bytes).ok()
    }
}

/// Side-channel event of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection closed
    Disconnected {
        /// Why the remote side went away, if known
        reason: Option<String>,
    },
    /// Remote audio started
    AudioStarted,
    /// Remote audio stopped
    AudioStopped,
    /// Transport-level error
    Error(String),
    /// DTMF tone received
    Dtmf(char),
}

impl TransportEvent {
    /// Stable event name for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::AudioStarted => "audio_started",
            Self::AudioStopped => "audio_stopped",
            Self::Error(_) => "error",
            Self::Dtmf(_) => "dtmf",
        }
    }

    /// Whether no further events follow
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

/// Check DTMF digits: `0-9`, `*`, `#` and `A-D`
pub fn validate_dtmf(digits: &str) -> Result<(), TelephonyError> {
    let valid = !digits.is_empty()
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c.to_ascii_uppercase(), '*' | '#' | 'A'..='D'));
    if valid {
        Ok(())
    } else {
        Err(TelephonyError::InvalidDtmf(digits.to_string()))
    }
}

/// An active transport connection
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Connection identifier
    fn id(&self) -> &str;

    /// Remote address, when the protocol exposes one
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// Send audio to the remote party
    async fn send_audio(&self, audio: Bytes) -> Result<(), TelephonyError>;

    /// Audio received from the remote party
    ///
    /// The stream can be taken once; later calls return `None`.
    fn take_audio_out(&self) -> Option<AudioByteStream>;

    /// Side-channel events; can be taken once
    fn take_events(&self) -> Option<TransportEventStream>;

    /// Close the connection; closing twice is a no-op
    async fn close(&self) -> Result<(), TelephonyError>;
}

/// An audio transport protocol
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name
    fn name(&self) -> &str;

    /// Protocol identifier ("webrtc", "sip", "websocket", ...)
    fn protocol(&self) -> &str;

    /// Accept incoming connections on `addr`
    async fn listen(&self, addr: &str) -> Result<ConnectionStream, TelephonyError>;

    /// Open an outbound connection
    async fn connect(
        &self,
        addr: &str,
        config: &TransportConfig,
    ) -> Result<Arc<dyn Connection>, TelephonyError>;

    /// Shut the transport down
    async fn close(&self) -> Result<(), TelephonyError>;
}

/// Telephony features on top of a transport
///
/// Received DTMF tones arrive as [`TransportEvent::Dtmf`].
#[async_trait]
pub trait TelephonyTransport: Transport {
    /// Send DTMF tones
    async fn send_dtmf(&self, conn: &dyn Connection, digits: &str) -> Result<(), TelephonyError>;

    /// Transfer the call to another number
    async fn transfer(&self, conn: &dyn Connection, target: &str) -> Result<(), TelephonyError>;

    /// Place the call on hold
    async fn hold(&self, conn: &dyn Connection) -> Result<(), TelephonyError>;

    /// Resume a held call
    async fn unhold(&self, conn: &dyn Connection) -> Result<(), TelephonyError>;
}

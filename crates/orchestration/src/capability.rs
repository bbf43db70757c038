//! Capability model
//!
//! Capabilities are fixed when a provider is registered and stored as a
//! bitset on its registry entry, so dispatch never inspects provider types.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The speech direction a client serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Speech-to-text
    Stt,
    /// Text-to-speech
    Tts,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stt => write!(f, "stt"),
            Self::Tts => write!(f, "tts"),
        }
    }
}

/// A single capability tier a request may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Whole-payload request and response
    Batch,
    /// Live output stream
    Streaming,
    /// Live output stream fed by live text input
    TextInputStreaming,
}

impl Capability {
    /// The flag representing this tier
    #[must_use]
    pub const fn flag(self) -> CapabilitySet {
        match self {
            Self::Batch => CapabilitySet::BATCH,
            Self::Streaming => CapabilitySet::STREAMING,
            Self::TextInputStreaming => CapabilitySet::TEXT_INPUT_STREAMING,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => write!(f, "batch"),
            Self::Streaming => write!(f, "streaming"),
            Self::TextInputStreaming => write!(f, "text-input streaming"),
        }
    }
}

bitflags! {
    /// Capabilities declared by one provider
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilitySet: u8 {
        /// Base contract, always present
        const BATCH = 1;
        /// Streaming extension
        const STREAMING = 1 << 1;
        /// Streaming synthesis from incremental text
        const TEXT_INPUT_STREAMING = 1 << 2;
    }
}

impl CapabilitySet {
    /// Whether the set satisfies a required capability
    #[must_use]
    pub const fn supports(self, capability: Capability) -> bool {
        self.contains(capability.flag())
    }
}

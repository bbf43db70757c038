//! Request configuration for transcription and synthesis
//!
//! The core-owned fields are typed. Vendor knobs that only one provider
//! understands (stability, similarity boost, custom endpoints, ...) go into
//! [`ProviderOptions`], an open map each provider validates for itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SpeechError;
use crate::types::AudioFormat;

/// Open, provider-validated option map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderOptions(BTreeMap<String, Value>);

impl ProviderOptions {
    /// Create an empty option map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, returning the updated map
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set an option in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Raw option value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Option as a float, if present and numeric
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Option as a string, if present and textual
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Option as a boolean, if present and boolean
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configures one speech-to-text request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// BCP-47 language code (e.g. "en-US"); `None` for automatic detection
    pub language: Option<String>,
    /// Provider-specific model identifier
    pub model: Option<String>,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: Option<u16>,
    /// Audio encoding of the input
    pub encoding: Option<AudioFormat>,
    /// Add punctuation to the transcript
    pub enable_punctuation: bool,
    /// Include word-level timestamps
    pub enable_word_timestamps: bool,
    /// Label different speakers
    pub enable_speaker_diarization: bool,
    /// Upper bound of speakers to detect when diarizing
    pub max_speakers: Option<u16>,
    /// Words or phrases to boost
    pub keywords: Vec<String>,
    /// Provider-specific custom vocabulary id
    pub vocabulary_id: Option<String>,
    /// Vendor-only knobs
    pub options: ProviderOptions,
}

impl TranscriptionConfig {
    /// Config with a language hint
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Config with an explicit input encoding and sample rate
    #[must_use]
    pub const fn with_encoding(mut self, encoding: AudioFormat, sample_rate: u32) -> Self {
        self.encoding = Some(encoding);
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Sanity checks shared by all providers
    ///
    /// Providers call this before talking to their backend; the
    /// orchestration layer never does.
    pub fn validate(&self) -> Result<(), SpeechError> {
        if self.sample_rate == Some(0) {
            return Err(SpeechError::InvalidConfig(
                "sample rate must be greater than 0".to_string(),
            ));
        }

        if let Some(channels) = self.channels.filter(|c| !(1..=8).contains(c)) {
            return Err(SpeechError::InvalidConfig(format!(
                "channels must be between 1 and 8, got {channels}"
            )));
        }

        if self.max_speakers.is_some() && !self.enable_speaker_diarization {
            return Err(SpeechError::InvalidConfig(
                "max_speakers requires speaker diarization".to_string(),
            ));
        }

        if self.max_speakers == Some(0) {
            return Err(SpeechError::InvalidConfig(
                "max_speakers must be greater than 0".to_string(),
            ));
        }

        if self.language.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(SpeechError::InvalidConfig(
                "language must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configures one text-to-speech request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Voice to use; `None` selects the provider default
    pub voice_id: Option<String>,
    /// Provider-specific model identifier
    pub model: Option<String>,
    /// Desired output format
    pub output_format: Option<AudioFormat>,
    /// Output sample rate in Hz (e.g. 22050, 44100)
    pub sample_rate: Option<u32>,
    /// Speech speed multiplier (1.0 = normal)
    pub speed: f32,
    /// Pitch adjustment (-1.0 to 1.0, 0 = normal)
    pub pitch: f32,
    /// Vendor-only knobs such as `stability` or `similarity_boost`
    pub options: ProviderOptions,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice_id: None,
            model: None,
            output_format: None,
            sample_rate: None,
            speed: 1.0,
            pitch: 0.0,
            options: ProviderOptions::default(),
        }
    }
}

impl SynthesisConfig {
    /// Config for a specific voice
    #[must_use]
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Config with an output format
    #[must_use]
    pub const fn with_format(mut self, format: AudioFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Sanity checks shared by all providers
    pub fn validate(&self) -> Result<(), SpeechError> {
        if !(0.25..=4.0).contains(&self.speed) {
            return Err(SpeechError::InvalidConfig(format!(
                "speed must be between 0.25 and 4.0, got {}",
                self.speed
            )));
        }

        if !(-1.0..=1.0).contains(&self.pitch) {
            return Err(SpeechError::InvalidConfig(format!(
                "pitch must be between -1.0 and 1.0, got {}",
                self.pitch
            )));
        }

        if self.sample_rate == Some(0) {
            return Err(SpeechError::InvalidConfig(
                "sample rate must be greater than 0".to_string(),
            ));
        }

        if self.voice_id.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(SpeechError::InvalidConfig(
                "voice id must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}

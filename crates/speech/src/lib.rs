//! Speech - Speech-to-Text and Text-to-Speech provider ports
//!
//! Provides the contracts every speech vendor adapter implements:
//! - `SpeechToText` / `StreamingSpeechToText` - Transcribe audio to text (STT)
//! - `TextToSpeech` / `StreamingTextToSpeech` - Synthesize speech from text (TTS)
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `types` and `config` define the request and result values
//! - `stream` holds the scoped handles used by streaming sessions
//!
//! Vendor adapters live outside this workspace. The `orchestration` crate
//! drives these ports with primary/fallback selection.
//!
//! # Example
//!
//! ```ignore
//! use speech::{AudioData, AudioFormat, SpeechToText, TranscriptionConfig};
//!
//! let audio = AudioData::new(bytes, AudioFormat::Wav);
//! let transcription = provider
//!     .transcribe(audio, &TranscriptionConfig::default())
//!     .await?;
//! println!("Transcribed: {}", transcription.text);
//! ```

pub mod config;
pub mod error;
pub mod ports;
pub mod stream;
pub mod types;

pub use config::{ProviderOptions, SynthesisConfig, TranscriptionConfig};
pub use error::SpeechError;
pub use ports::{
    NamedProvider, SpeechToText, StreamingSpeechToText, StreamingTextToSpeech, TextToSpeech,
};
pub use stream::{AudioChunkStream, AudioSink, SttStream, TextStream, TranscriptEventStream};
pub use types::{
    AudioChunk, AudioData, AudioFormat, Segment, SynthesizedAudio, TranscriptEvent,
    Transcription, VoiceGender, VoiceInfo, WordTimestamp,
};

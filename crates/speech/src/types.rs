//! Types for speech processing
//!
//! Contains data structures for audio data, formats, transcriptions, stream
//! events, synthesis results and voice information.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Raw linear PCM (16-bit little endian)
    Pcm,
    /// G.711 mu-law, the usual telephony payload
    Mulaw,
    /// Opus codec
    Opus,
    /// OGG container (typically with Opus codec)
    Ogg,
    /// MP3 format
    Mp3,
    /// WAV format (uncompressed)
    Wav,
    /// FLAC format (lossless)
    Flac,
    /// WebM format
    Webm,
    /// M4A/AAC format
    M4a,
}

impl AudioFormat {
    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Pcm => "audio/pcm",
            Self::Mulaw => "audio/basic",
            Self::Opus => "audio/opus",
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Webm => "audio/webm",
            Self::M4a => "audio/m4a",
        }
    }

    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::Mulaw => "ulaw",
            Self::Opus => "opus",
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Webm => "webm",
            Self::M4a => "m4a",
        }
    }

    /// Parse audio format from MIME type
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        // Handle compound MIME types like "audio/ogg; codecs=opus"
        let base_mime = mime.split(';').next().unwrap_or(mime).trim();

        match base_mime {
            "audio/pcm" | "audio/l16" => Some(Self::Pcm),
            "audio/basic" | "audio/x-mulaw" => Some(Self::Mulaw),
            "audio/opus" => Some(Self::Opus),
            "audio/ogg" => {
                if mime.contains("codecs=opus") {
                    Some(Self::Opus)
                } else {
                    Some(Self::Ogg)
                }
            },
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/webm" => Some(Self::Webm),
            "audio/m4a" | "audio/mp4" | "audio/x-m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    /// Parse audio format from a file extension (without the dot)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pcm" | "raw" => Some(Self::Pcm),
            "ulaw" | "mulaw" | "au" => Some(Self::Mulaw),
            "opus" => Some(Self::Opus),
            "ogg" | "oga" => Some(Self::Ogg),
            "mp3" => Some(Self::Mp3),
            "wav" | "wave" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "webm" => Some(Self::Webm),
            "m4a" | "mp4" | "aac" => Some(Self::M4a),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Container for audio data with metadata
///
/// The payload is reference counted, so handing the same audio to several
/// providers in turn does not copy it.
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Bytes,
    format: AudioFormat,
    duration_ms: Option<u64>,
    sample_rate: Option<u32>,
}

impl AudioData {
    /// Create new audio data
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            data: data.into(),
            format,
            duration_ms: None,
            sample_rate: None,
        }
    }

    /// Create audio data with duration
    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Create audio data with sample rate
    #[must_use]
    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Get the raw audio bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Cheap handle to the underlying buffer
    #[must_use]
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Consume and return the raw audio bytes
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Get the audio format
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Get the duration in milliseconds (if known)
    #[must_use]
    pub const fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Get the sample rate (if known)
    #[must_use]
    pub const fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Get the size of the audio data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the audio data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the MIME type for this audio
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Generate a filename with appropriate extension
    #[must_use]
    pub fn filename(&self, base: &str) -> String {
        format!("{}.{}", base, self.format.extension())
    }
}

/// Word-level timing from transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    /// The word
    pub word: String,
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds
    pub end_ms: u64,
    /// Confidence for this word
    pub confidence: Option<f32>,
    /// Speaker label when diarization is enabled
    pub speaker: Option<String>,
}

/// A sentence or phrase of a transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Transcribed text for this segment
    pub text: String,
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds
    pub end_ms: u64,
    /// Average confidence for this segment
    pub confidence: Option<f32>,
    /// Speaker label when diarization is enabled
    pub speaker: Option<String>,
    /// Detected language of this segment
    pub language: Option<String>,
    /// Word-level details (if requested)
    #[serde(default)]
    pub words: Vec<WordTimestamp>,
}

impl Segment {
    /// Create a segment spanning `start_ms..end_ms`
    #[must_use]
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            confidence: None,
            speaker: None,
            language: None,
            words: Vec::new(),
        }
    }

    /// Length of the segment in milliseconds
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Result of speech-to-text transcription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Transcribed text
    pub text: String,
    /// Detected language (BCP-47 or ISO 639-1 code)
    pub language: Option<String>,
    /// Confidence of the language detection (0.0 - 1.0)
    pub language_confidence: Option<f32>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: Option<f32>,
    /// Duration of the audio in milliseconds
    pub duration_ms: Option<u64>,
    /// Segment-level details
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcription {
    /// Create a simple transcription with just text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            language_confidence: None,
            confidence: None,
            duration_ms: None,
            segments: Vec::new(),
        }
    }

    /// Set the detected language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the confidence score
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the duration
    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Append a segment
    #[must_use]
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Distinct speaker labels in order of first appearance
    #[must_use]
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for speaker in self.segments.iter().filter_map(|s| s.speaker.as_deref()) {
            if !seen.contains(&speaker) {
                seen.push(speaker);
            }
        }
        seen
    }

    /// Check if transcription is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Incremental event of a streaming transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEvent {
    /// Partial or final transcript
    Transcript {
        /// Current transcript text
        text: String,
        /// Whether this result is final (non-interim)
        is_final: bool,
        /// Segment details, usually only on final results
        segment: Option<Segment>,
    },
    /// Voice activity started
    SpeechStarted,
    /// Voice activity ended
    SpeechEnded,
}

impl TranscriptEvent {
    /// Interim transcript
    #[must_use]
    pub fn partial(text: impl Into<String>) -> Self {
        Self::Transcript {
            text: text.into(),
            is_final: false,
            segment: None,
        }
    }

    /// Final transcript
    #[must_use]
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::Transcript {
            text: text.into(),
            is_final: true,
            segment: None,
        }
    }

    /// Whether this is a final transcript
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Transcript { is_final: true, .. })
    }

    /// Transcript text carried by the event, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Transcript { text, .. } => Some(text),
            Self::SpeechStarted | Self::SpeechEnded => None,
        }
    }
}

/// Result of text-to-speech synthesis
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Synthesized audio
    pub audio: AudioData,
    /// Number of characters processed (billing unit for most vendors)
    pub character_count: usize,
}

impl SynthesizedAudio {
    /// Wrap synthesized audio, counting the characters of `text`
    #[must_use]
    pub fn new(audio: AudioData, text: &str) -> Self {
        Self {
            audio,
            character_count: text.chars().count(),
        }
    }
}

/// A chunk of streamed synthesized audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Audio payload
    pub data: Bytes,
    /// Whether this is the last chunk
    pub is_final: bool,
}

impl AudioChunk {
    /// Intermediate chunk
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            is_final: false,
        }
    }

    /// Last chunk of the stream
    #[must_use]
    pub fn last(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            is_final: true,
        }
    }
}

/// Information about an available voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of the voice
    pub description: Option<String>,
    /// Supported languages
    #[serde(default)]
    pub languages: Vec<String>,
    /// Voice gender (if known)
    pub gender: Option<VoiceGender>,
    /// Name of the provider offering this voice
    pub provider: Option<String>,
    /// Provider-specific extra information
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl VoiceInfo {
    /// Create a new voice info
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            languages: Vec::new(),
            gender: None,
            provider: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the provider name
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Add a supported language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }
}

/// Voice gender classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    /// Male voice
    Male,
    /// Female voice
    Female,
    /// Neutral/androgynous voice
    Neutral,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod audio_format {
        use super::*;

        #[test]
        fn mime_types_are_correct() {
            assert_eq!(AudioFormat::Pcm.mime_type(), "audio/pcm");
            assert_eq!(AudioFormat::Mulaw.mime_type(), "audio/basic");
            assert_eq!(AudioFormat::Opus.mime_type(), "audio/opus");
            assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
            assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
        }

        #[test]
        fn from_mime_type_with_codecs() {
            assert_eq!(
                AudioFormat::from_mime_type("audio/ogg; codecs=opus"),
                Some(AudioFormat::Opus)
            );
            assert_eq!(
                AudioFormat::from_mime_type("audio/ogg"),
                Some(AudioFormat::Ogg)
            );
        }

        #[test]
        fn from_mime_type_unknown() {
            assert_eq!(AudioFormat::from_mime_type("audio/unknown"), None);
            assert_eq!(AudioFormat::from_mime_type("text/plain"), None);
        }

        #[test]
        fn from_extension_is_case_insensitive() {
            assert_eq!(AudioFormat::from_extension("WAV"), Some(AudioFormat::Wav));
            assert_eq!(AudioFormat::from_extension("mp3"), Some(AudioFormat::Mp3));
            assert_eq!(AudioFormat::from_extension("ulaw"), Some(AudioFormat::Mulaw));
            assert_eq!(AudioFormat::from_extension("txt"), None);
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&AudioFormat::Mulaw).unwrap();
            assert_eq!(json, "\"mulaw\"");
        }
    }

    mod audio_data {
        use super::*;

        #[test]
        fn new_creates_audio_data() {
            let data = vec![1_u8, 2, 3, 4];
            let audio = AudioData::new(data.clone(), AudioFormat::Mp3);

            assert_eq!(audio.data(), data.as_slice());
            assert_eq!(audio.format(), AudioFormat::Mp3);
            assert_eq!(audio.duration_ms(), None);
            assert_eq!(audio.sample_rate(), None);
        }

        #[test]
        fn clones_share_the_buffer() {
            let audio = AudioData::new(vec![0_u8; 4096], AudioFormat::Wav);
            let copy = audio.clone();
            assert_eq!(audio.bytes().as_ptr(), copy.bytes().as_ptr());
        }

        #[test]
        fn builders_set_metadata() {
            let audio = AudioData::new(vec![1_u8, 2, 3], AudioFormat::Pcm)
                .with_duration(5000)
                .with_sample_rate(16000);
            assert_eq!(audio.duration_ms(), Some(5000));
            assert_eq!(audio.sample_rate(), Some(16000));
            assert_eq!(audio.size_bytes(), 3);
        }

        #[test]
        fn is_empty_returns_true_for_empty_data() {
            let audio = AudioData::new(Vec::<u8>::new(), AudioFormat::Mp3);
            assert!(audio.is_empty());
        }

        #[test]
        fn filename_includes_extension() {
            let audio = AudioData::new(Vec::<u8>::new(), AudioFormat::Mp3);
            assert_eq!(audio.filename("voice_message"), "voice_message.mp3");
        }
    }

    mod transcription {
        use super::*;

        #[test]
        fn new_creates_simple_transcription() {
            let transcription = Transcription::new("Hello, world!");
            assert_eq!(transcription.text, "Hello, world!");
            assert!(transcription.language.is_none());
            assert!(transcription.segments.is_empty());
        }

        #[test]
        fn is_empty_returns_true_for_whitespace_only() {
            assert!(Transcription::new("   \n\t  ").is_empty());
            assert!(!Transcription::new("Hello").is_empty());
        }

        #[test]
        fn speakers_are_deduplicated_in_order() {
            let mut first = Segment::new("hi", 0, 500);
            first.speaker = Some("B".into());
            let mut second = Segment::new("hello", 500, 900);
            second.speaker = Some("A".into());
            let mut third = Segment::new("bye", 900, 1200);
            third.speaker = Some("B".into());

            let transcription = Transcription::new("hi hello bye")
                .with_segment(first)
                .with_segment(second)
                .with_segment(third);

            assert_eq!(transcription.speakers(), vec!["B", "A"]);
        }

        #[test]
        fn segment_duration_saturates() {
            assert_eq!(Segment::new("x", 100, 350).duration_ms(), 250);
            assert_eq!(Segment::new("x", 400, 100).duration_ms(), 0);
        }
    }

    mod events {
        use super::*;

        #[test]
        fn final_flag_and_text() {
            assert!(TranscriptEvent::final_text("done").is_final());
            assert!(!TranscriptEvent::partial("do").is_final());
            assert_eq!(TranscriptEvent::partial("do").text(), Some("do"));
            assert_eq!(TranscriptEvent::SpeechStarted.text(), None);
        }

        #[test]
        fn serializes_with_type_tag() {
            let json = serde_json::to_value(TranscriptEvent::SpeechEnded).unwrap();
            assert_eq!(json["type"], "speech_ended");
        }
    }

    #[test]
    fn synthesized_audio_counts_characters() {
        let audio = AudioData::new(vec![0_u8, 1], AudioFormat::Mp3);
        let result = SynthesizedAudio::new(audio, "héllo");
        assert_eq!(result.character_count, 5);
    }

    #[test]
    fn voice_info_builder() {
        let voice = VoiceInfo::new("alloy", "Alloy")
            .with_provider("cloud")
            .with_language("en-US");
        assert_eq!(voice.provider.as_deref(), Some("cloud"));
        assert_eq!(voice.languages, vec!["en-US".to_string()]);
        assert!(voice.metadata.is_empty());
    }
}

//! Port definitions for speech processing
//!
//! Defines the traits (ports) that vendor adapters implement. Each modality
//! has a base trait for whole-payload requests and an extension trait for
//! live streaming. Implementations must be safe to call concurrently.

use std::path::Path;

use async_trait::async_trait;

use crate::config::{SynthesisConfig, TranscriptionConfig};
use crate::error::SpeechError;
use crate::stream::{AudioChunkStream, SttStream, TextStream};
use crate::types::{AudioData, AudioFormat, SynthesizedAudio, Transcription, VoiceInfo};

/// Identity shared by every provider
pub trait NamedProvider: Send + Sync {
    /// Stable, unique provider name (e.g. "deepgram", "local-whisper")
    fn name(&self) -> &str;
}

/// Port for Speech-to-Text (STT) implementations
///
/// # Example
///
/// ```ignore
/// use speech::{AudioData, SpeechToText, TranscriptionConfig};
///
/// async fn transcribe_voice_message(
///     stt: &impl SpeechToText,
///     audio: AudioData,
/// ) -> Result<String, SpeechError> {
///     let transcription = stt.transcribe(audio, &TranscriptionConfig::default()).await?;
///     Ok(transcription.text)
/// }
/// ```
#[async_trait]
pub trait SpeechToText: NamedProvider {
    /// Transcribe a complete audio buffer
    async fn transcribe(
        &self,
        audio: AudioData,
        config: &TranscriptionConfig,
    ) -> Result<Transcription, SpeechError>;

    /// Transcribe audio stored in a local file
    ///
    /// The default reads the file and infers the format from its extension,
    /// falling back to `config.encoding`.
    async fn transcribe_file(
        &self,
        path: &Path,
        config: &TranscriptionConfig,
    ) -> Result<Transcription, SpeechError> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            .or(config.encoding)
            .ok_or_else(|| {
                SpeechError::UnsupportedFormat(format!(
                    "cannot infer audio format of {}",
                    path.display()
                ))
            })?;

        let data = tokio::fs::read(path).await?;
        self.transcribe(AudioData::new(data, format), config).await
    }

    /// Transcribe audio the provider fetches from a URL
    ///
    /// Only vendors with server-side fetching support this.
    async fn transcribe_url(
        &self,
        url: &str,
        _config: &TranscriptionConfig,
    ) -> Result<Transcription, SpeechError> {
        Err(SpeechError::UnsupportedInput(format!(
            "{} cannot fetch audio from URL {url}",
            self.name()
        )))
    }
}

/// Real-time transcription extension
#[async_trait]
pub trait StreamingSpeechToText: SpeechToText {
    /// Open a streaming session
    ///
    /// The caller writes audio into the returned sink and reads incremental
    /// events from the returned stream. The stream ends when the provider
    /// finishes after the sink is closed, or with a terminal error.
    async fn transcribe_stream(&self, config: &TranscriptionConfig)
    -> Result<SttStream, SpeechError>;
}

/// Port for Text-to-Speech (TTS) implementations
#[async_trait]
pub trait TextToSpeech: NamedProvider {
    /// Synthesize the complete text
    async fn synthesize(
        &self,
        text: &str,
        config: &SynthesisConfig,
    ) -> Result<SynthesizedAudio, SpeechError>;

    /// List available voices
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Look up a single voice
    ///
    /// The default scans `list_voices`.
    async fn get_voice(&self, voice_id: &str) -> Result<VoiceInfo, SpeechError> {
        self.list_voices()
            .await?
            .into_iter()
            .find(|voice| voice.id == voice_id)
            .ok_or_else(|| SpeechError::VoiceNotFound(voice_id.to_string()))
    }
}

/// Streaming synthesis extension
#[async_trait]
pub trait StreamingTextToSpeech: TextToSpeech {
    /// Synthesize text and stream audio as it is produced
    async fn synthesize_stream(
        &self,
        text: &str,
        config: &SynthesisConfig,
    ) -> Result<AudioChunkStream, SpeechError>;

    /// Whether [`Self::synthesize_text_stream`] is implemented
    ///
    /// Read once when the provider is registered.
    fn accepts_text_stream(&self) -> bool {
        false
    }

    /// Synthesize text that itself arrives incrementally
    async fn synthesize_text_stream(
        &self,
        _text: TextStream,
        _config: &SynthesisConfig,
    ) -> Result<AudioChunkStream, SpeechError> {
        Err(SpeechError::StreamingNotSupported(self.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use futures::StreamExt;

    use super::*;
    use crate::types::AudioChunk;

    /// Mock implementation for testing
    struct MockSpeechToText {
        name: String,
    }

    impl NamedProvider for MockSpeechToText {
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[async_trait]
    impl SpeechToText for MockSpeechToText {
        async fn transcribe(
            &self,
            audio: AudioData,
            config: &TranscriptionConfig,
        ) -> Result<Transcription, SpeechError> {
            let transcription = Transcription::new(format!(
                "{} bytes of {}",
                audio.size_bytes(),
                audio.format()
            ));
            Ok(match &config.language {
                Some(language) => transcription.with_language(language.clone()),
                None => transcription,
            })
        }
    }

    struct MockTextToSpeech;

    impl NamedProvider for MockTextToSpeech {
        fn name(&self) -> &str {
            "mock-tts"
        }
    }

    #[async_trait]
    impl TextToSpeech for MockTextToSpeech {
        async fn synthesize(
            &self,
            text: &str,
            config: &SynthesisConfig,
        ) -> Result<SynthesizedAudio, SpeechError> {
            let format = config.output_format.unwrap_or(AudioFormat::Mp3);
            Ok(SynthesizedAudio::new(
                AudioData::new(vec![0_u8, 1, 2, 3], format),
                text,
            ))
        }

        async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
            Ok(vec![
                VoiceInfo::new("alloy", "Alloy"),
                VoiceInfo::new("nova", "Nova"),
            ])
        }
    }

    #[async_trait]
    impl StreamingTextToSpeech for MockTextToSpeech {
        async fn synthesize_stream(
            &self,
            _text: &str,
            _config: &SynthesisConfig,
        ) -> Result<AudioChunkStream, SpeechError> {
            Ok(Box::pin(futures::stream::iter(vec![
                Ok(AudioChunk::new(vec![1_u8])),
                Ok(AudioChunk::last(vec![2_u8])),
            ])))
        }
    }

    fn stt() -> MockSpeechToText {
        MockSpeechToText {
            name: "mock-stt".to_string(),
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SpeechToText>();
        assert_send_sync::<dyn StreamingSpeechToText>();
        assert_send_sync::<dyn TextToSpeech>();
        assert_send_sync::<dyn StreamingTextToSpeech>();
    }

    #[tokio::test]
    async fn mock_stt_transcribes_with_language() {
        let audio = AudioData::new(vec![0_u8, 1, 2], AudioFormat::Mp3);
        let config = TranscriptionConfig::default().with_language("de");

        let transcription = stt().transcribe(audio, &config).await.unwrap();

        assert_eq!(transcription.text, "3 bytes of mp3");
        assert_eq!(transcription.language.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn transcribe_file_infers_format_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let transcription = stt()
            .transcribe_file(file.path(), &TranscriptionConfig::default())
            .await
            .unwrap();

        assert_eq!(transcription.text, "5 bytes of wav");
    }

    #[tokio::test]
    async fn transcribe_file_falls_back_to_configured_encoding() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&[1, 2]).unwrap();
        let config = TranscriptionConfig::default().with_encoding(AudioFormat::Pcm, 16000);

        let transcription = stt().transcribe_file(file.path(), &config).await.unwrap();

        assert_eq!(transcription.text, "2 bytes of pcm");
    }

    #[tokio::test]
    async fn transcribe_file_rejects_unknown_format() {
        let file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();

        let result = stt()
            .transcribe_file(file.path(), &TranscriptionConfig::default())
            .await;

        assert!(matches!(result, Err(SpeechError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn transcribe_file_missing_file_is_invalid_audio() {
        let result = stt()
            .transcribe_file(
                Path::new("/definitely/not/here.wav"),
                &TranscriptionConfig::default(),
            )
            .await;

        assert!(matches!(result, Err(SpeechError::InvalidAudio(_))));
    }

    #[tokio::test]
    async fn transcribe_url_is_unsupported_by_default() {
        let result = stt()
            .transcribe_url("https://example.com/a.wav", &TranscriptionConfig::default())
            .await;

        assert!(matches!(result, Err(SpeechError::UnsupportedInput(_))));
    }

    #[tokio::test]
    async fn get_voice_scans_list_voices() {
        let tts = MockTextToSpeech;

        let voice = tts.get_voice("nova").await.unwrap();
        assert_eq!(voice.name, "Nova");

        let missing = tts.get_voice("echo").await;
        assert!(matches!(missing, Err(SpeechError::VoiceNotFound(id)) if id == "echo"));
    }

    #[tokio::test]
    async fn mock_tts_synthesizes_with_format() {
        let config = SynthesisConfig::default().with_format(AudioFormat::Opus);

        let result = MockTextToSpeech.synthesize("Hello", &config).await.unwrap();

        assert_eq!(result.audio.format(), AudioFormat::Opus);
        assert_eq!(result.character_count, 5);
    }

    #[tokio::test]
    async fn text_stream_input_is_opt_in() {
        let tts = MockTextToSpeech;
        assert!(!tts.accepts_text_stream());

        let text: TextStream = Box::pin(futures::stream::iter(vec!["hi".to_string()]));
        let result = tts
            .synthesize_text_stream(text, &SynthesisConfig::default())
            .await;
        assert!(matches!(result, Err(SpeechError::StreamingNotSupported(name)) if name == "mock-tts"));
    }

    #[tokio::test]
    async fn synthesize_stream_yields_chunks() {
        let chunks: Vec<_> = MockTextToSpeech
            .synthesize_stream("hi", &SynthesisConfig::default())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].as_ref().unwrap().is_final);
    }
}

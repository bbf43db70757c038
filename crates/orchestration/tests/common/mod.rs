//! Call-counting stub providers shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use speech::{
    AudioChunk, AudioChunkStream, AudioData, AudioFormat, AudioSink, NamedProvider, SpeechError,
    SpeechToText, SttStream, StreamingSpeechToText, StreamingTextToSpeech, SynthesisConfig,
    SynthesizedAudio, TextStream, TextToSpeech, TranscriptEvent, Transcription,
    TranscriptionConfig, VoiceInfo,
};

/// Provider names in the order they were invoked, across all stubs
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Shared state of one stub
#[derive(Debug)]
pub struct Script {
    name: String,
    calls: Arc<AtomicUsize>,
    /// Errors returned by the next calls, in order
    queued: Mutex<VecDeque<SpeechError>>,
    /// Error returned once `queued` is drained; `None` means success
    steady: Option<SpeechError>,
    log: Option<CallLog>,
}

impl Script {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            queued: Mutex::new(VecDeque::new()),
            steady: None,
            log: None,
        }
    }

    fn next(&self) -> Result<(), SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push(self.name.clone());
        }
        if let Some(err) = self.queued.lock().pop_front() {
            return Err(err);
        }
        self.steady.clone().map_or(Ok(()), Err)
    }
}

/// Configures a stub before it is handed to a client
pub trait StubExt: Sized {
    fn script_mut(&mut self) -> &mut Script;

    /// Fail every call with `err`
    fn failing(mut self, err: SpeechError) -> Self {
        self.script_mut().steady = Some(err);
        self
    }

    /// Fail the next call with `err`, then behave as before
    fn failing_once(mut self, err: SpeechError) -> Self {
        self.script_mut().queued.get_mut().push_back(err);
        self
    }

    /// Append every invocation to `log`
    fn logging(mut self, log: &CallLog) -> Self {
        self.script_mut().log = Some(Arc::clone(log));
        self
    }

    /// Counter of invocations, readable after the stub moved into a client
    fn counter(&mut self) -> Arc<AtomicUsize> {
        Arc::clone(&self.script_mut().calls)
    }
}

// ---------------------------------------------------------------------------
// STT
// ---------------------------------------------------------------------------

/// Batch-only STT stub; transcripts name the provider
#[derive(Debug)]
pub struct StubStt {
    script: Script,
}

impl StubStt {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
        }
    }
}

impl StubExt for StubStt {
    fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }
}

impl NamedProvider for StubStt {
    fn name(&self) -> &str {
        &self.script.name
    }
}

#[async_trait]
impl SpeechToText for StubStt {
    async fn transcribe(
        &self,
        _audio: AudioData,
        _config: &TranscriptionConfig,
    ) -> Result<Transcription, SpeechError> {
        self.script.next()?;
        Ok(Transcription::new(format!("from {}", self.script.name)))
    }
}

/// STT stub with streaming sessions
///
/// A session echoes every written chunk as a partial transcript. With
/// `fail_after_first_event` the provider fails right after its first event.
#[derive(Debug)]
pub struct StubStreamingStt {
    script: Script,
    fail_after_first_event: bool,
}

impl StubStreamingStt {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
            fail_after_first_event: false,
        }
    }

    pub fn failing_mid_stream(mut self) -> Self {
        self.fail_after_first_event = true;
        self
    }
}

impl StubExt for StubStreamingStt {
    fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }
}

impl NamedProvider for StubStreamingStt {
    fn name(&self) -> &str {
        &self.script.name
    }
}

#[async_trait]
impl SpeechToText for StubStreamingStt {
    async fn transcribe(
        &self,
        _audio: AudioData,
        _config: &TranscriptionConfig,
    ) -> Result<Transcription, SpeechError> {
        self.script.next()?;
        Ok(Transcription::new(format!("from {}", self.script.name)))
    }
}

#[async_trait]
impl StreamingSpeechToText for StubStreamingStt {
    async fn transcribe_stream(
        &self,
        _config: &TranscriptionConfig,
    ) -> Result<SttStream, SpeechError> {
        self.script.next()?;

        let (sink, rx) = AudioSink::channel(8);
        let name = self.script.name.clone();
        let fail = self.fail_after_first_event;

        let events = futures::stream::unfold(
            (rx, 0_usize),
            move |(mut rx, emitted)| {
                let name = name.clone();
                async move {
                    if fail && emitted == 1 {
                        return Some((
                            Err(SpeechError::ConnectionFailed(format!("{name} dropped"))),
                            (rx, emitted + 1),
                        ));
                    }
                    if fail && emitted > 1 {
                        return None;
                    }
                    let chunk = rx.recv().await?;
                    let event = TranscriptEvent::partial(format!("{name}:{}", chunk.len()));
                    Some((Ok(event), (rx, emitted + 1)))
                }
            },
        );

        Ok(SttStream::new(sink, Box::pin(events)))
    }
}

// ---------------------------------------------------------------------------
// TTS
// ---------------------------------------------------------------------------

/// Batch-only TTS stub
#[derive(Debug)]
pub struct StubTts {
    script: Script,
    voices: Vec<VoiceInfo>,
}

impl StubTts {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
            voices: Vec::new(),
        }
    }

    pub fn with_voices(mut self, ids: &[&str]) -> Self {
        self.voices = ids.iter().map(|id| VoiceInfo::new(*id, id.to_uppercase())).collect();
        self
    }
}

impl StubExt for StubTts {
    fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }
}

impl NamedProvider for StubTts {
    fn name(&self) -> &str {
        &self.script.name
    }
}

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(
        &self,
        text: &str,
        _config: &SynthesisConfig,
    ) -> Result<SynthesizedAudio, SpeechError> {
        self.script.next()?;
        Ok(SynthesizedAudio::new(
            AudioData::new(self.script.name.clone().into_bytes(), AudioFormat::Mp3),
            text,
        ))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        self.script.next()?;
        Ok(self.voices.clone())
    }
}

/// TTS stub with streamed synthesis
///
/// Streams the provider name as one chunk per byte. Accepts text input
/// streams when built with `accepting_text_stream`, echoing each text
/// fragment as a chunk.
#[derive(Debug)]
pub struct StubStreamingTts {
    script: Script,
    accepts_text: bool,
    fail_after_first_chunk: bool,
}

impl StubStreamingTts {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
            accepts_text: false,
            fail_after_first_chunk: false,
        }
    }

    pub fn accepting_text_stream(mut self) -> Self {
        self.accepts_text = true;
        self
    }

    pub fn failing_mid_stream(mut self) -> Self {
        self.fail_after_first_chunk = true;
        self
    }
}

impl StubExt for StubStreamingTts {
    fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }
}

impl NamedProvider for StubStreamingTts {
    fn name(&self) -> &str {
        &self.script.name
    }
}

#[async_trait]
impl TextToSpeech for StubStreamingTts {
    async fn synthesize(
        &self,
        text: &str,
        _config: &SynthesisConfig,
    ) -> Result<SynthesizedAudio, SpeechError> {
        self.script.next()?;
        Ok(SynthesizedAudio::new(
            AudioData::new(self.script.name.clone().into_bytes(), AudioFormat::Mp3),
            text,
        ))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        self.script.next()?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl StreamingTextToSpeech for StubStreamingTts {
    async fn synthesize_stream(
        &self,
        _text: &str,
        _config: &SynthesisConfig,
    ) -> Result<AudioChunkStream, SpeechError> {
        self.script.next()?;

        let mut items: Vec<Result<AudioChunk, SpeechError>> = self
            .script
            .name
            .bytes()
            .map(|b| Ok(AudioChunk::new(vec![b])))
            .collect();
        if self.fail_after_first_chunk {
            items.truncate(1);
            items.push(Err(SpeechError::SynthesisFailed("voice crashed".into())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn accepts_text_stream(&self) -> bool {
        self.accepts_text
    }

    async fn synthesize_text_stream(
        &self,
        text: TextStream,
        _config: &SynthesisConfig,
    ) -> Result<AudioChunkStream, SpeechError> {
        use futures::StreamExt;

        if !self.accepts_text {
            return Err(SpeechError::StreamingNotSupported(self.script.name.clone()));
        }
        self.script.next()?;
        Ok(Box::pin(
            text.map(|fragment| Ok(AudioChunk::new(fragment.into_bytes()))),
        ))
    }
}

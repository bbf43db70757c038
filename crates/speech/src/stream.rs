//! Streaming handles shared by providers and clients

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::SpeechError;
use crate::types::{AudioChunk, TranscriptEvent};

/// Incremental transcription events
pub type TranscriptEventStream =
    Pin<Box<dyn Stream<Item = Result<TranscriptEvent, SpeechError>> + Send>>;

/// Incremental synthesized audio
pub type AudioChunkStream = Pin<Box<dyn Stream<Item = Result<AudioChunk, SpeechError>> + Send>>;

/// Text fed into an input-streaming synthesizer (e.g. LLM tokens)
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Write side of a streaming transcription
///
/// Closing signals end of input to the provider. `close` may be called any
/// number of times; only the first call has an effect.
#[derive(Debug)]
pub struct AudioSink {
    tx: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl AudioSink {
    /// Create a sink and the receiver a provider reads audio from
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Send a chunk of audio
    ///
    /// Fails with [`SpeechError::StreamClosed`] once the sink is closed or
    /// the provider stopped reading.
    pub async fn write(&self, chunk: impl Into<Bytes>) -> Result<(), SpeechError> {
        // Clone out of the lock; the guard must not live across the await
        let tx = self.tx.lock().clone().ok_or(SpeechError::StreamClosed)?;
        tx.send(chunk.into())
            .await
            .map_err(|_| SpeechError::StreamClosed)
    }

    /// Signal end of input
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            trace!("Audio sink closed");
        }
    }

    /// Whether the sink can still accept audio
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.lock().as_ref().is_none_or(mpsc::Sender::is_closed)
    }
}

/// A live transcription session as returned by a provider
pub struct SttStream {
    /// Where the caller writes audio
    pub sink: AudioSink,
    /// Where the provider publishes results
    pub events: TranscriptEventStream,
}

impl std::fmt::Debug for SttStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SttStream")
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

impl SttStream {
    /// Bundle a sink with its event stream
    #[must_use]
    pub fn new(sink: AudioSink, events: TranscriptEventStream) -> Self {
        Self { sink, events }
    }
}

//! Established streaming sessions
//!
//! A session is bound to the provider that accepted it. Provider errors
//! after establishment end the stream; nothing here falls back.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::FusedStream;
use futures::{Stream, StreamExt, ready};
use speech::{AudioChunk, AudioSink, SpeechError, TranscriptEvent};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::capability::Modality;
use crate::error::ClientError;

type ProviderStream<T> = Pin<Box<dyn Stream<Item = Result<T, SpeechError>> + Send>>;

/// Provider stream that terminates exactly once
///
/// Yields items until the provider stream ends or fails. A failure is
/// surfaced as a single [`ClientError::StreamFailed`]; after that, or after
/// a normal end or [`SessionStream::close`], the stream only yields `None`.
pub struct SessionStream<T> {
    modality: Modality,
    provider: String,
    inner: Option<ProviderStream<T>>,
}

impl<T> SessionStream<T> {
    pub(crate) fn new(modality: Modality, provider: String, inner: ProviderStream<T>) -> Self {
        Self {
            modality,
            provider,
            inner: Some(inner),
        }
    }

    /// Provider serving the session
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Stop reading and release the provider stream
    ///
    /// Calling this more than once has no effect.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(provider = %self.provider, modality = %self.modality, "Session stream closed");
        }
    }
}

impl<T> Stream for SessionStream<T> {
    type Item = Result<T, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(inner.as_mut().poll_next(cx)) {
            Some(Ok(item)) => Poll::Ready(Some(Ok(item))),
            Some(Err(source)) => {
                this.inner = None;
                warn!(
                    provider = %this.provider,
                    modality = %this.modality,
                    "Stream failed: {source}"
                );
                Poll::Ready(Some(Err(ClientError::StreamFailed {
                    modality: this.modality,
                    provider: this.provider.clone(),
                    source,
                })))
            }
            None => {
                this.inner = None;
                debug!(provider = %this.provider, modality = %this.modality, "Stream ended");
                Poll::Ready(None)
            }
        }
    }
}

impl<T> FusedStream for SessionStream<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> fmt::Debug for SessionStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStream")
            .field("modality", &self.modality)
            .field("provider", &self.provider)
            .field("terminated", &self.inner.is_none())
            .finish()
    }
}

/// Live transcription session
///
/// Write audio with [`SttSession::write`], signal end of input with
/// [`SttSession::close_input`] and read events with
/// [`SttSession::next_event`]. Use [`SttSession::split`] to write and read
/// from different tasks.
#[derive(Debug)]
pub struct SttSession {
    id: Uuid,
    sink: AudioSink,
    events: SessionStream<TranscriptEvent>,
}

impl SttSession {
    pub(crate) fn new(provider: String, sink: AudioSink, events: ProviderStream<TranscriptEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink,
            events: SessionStream::new(Modality::Stt, provider, events),
        }
    }

    /// Session identifier, for log correlation
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Provider serving the session
    #[must_use]
    pub fn provider(&self) -> &str {
        self.events.provider()
    }

    /// Send audio to the provider
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::StreamClosed`] after input was closed or the
    /// provider stopped reading.
    pub async fn write(&self, chunk: impl Into<Bytes>) -> Result<(), SpeechError> {
        self.sink.write(chunk).await
    }

    /// Signal end of input; idempotent
    pub fn close_input(&self) {
        self.sink.close();
    }

    /// Next transcription event, or `None` once the session ended
    pub async fn next_event(&mut self) -> Option<Result<TranscriptEvent, ClientError>> {
        self.events.next().await
    }

    /// Close both directions; idempotent
    pub fn close(&mut self) {
        self.sink.close();
        self.events.close();
    }

    /// Separate the write side from the event stream
    #[must_use]
    pub fn split(self) -> (AudioSink, SessionStream<TranscriptEvent>) {
        (self.sink, self.events)
    }
}

/// Streamed synthesis output
#[derive(Debug)]
pub struct TtsStream {
    id: Uuid,
    chunks: SessionStream<AudioChunk>,
}

impl TtsStream {
    pub(crate) fn new(provider: String, chunks: ProviderStream<AudioChunk>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunks: SessionStream::new(Modality::Tts, provider, chunks),
        }
    }

    /// Stream identifier, for log correlation
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Provider producing the audio
    #[must_use]
    pub fn provider(&self) -> &str {
        self.chunks.provider()
    }

    /// Stop synthesis output; idempotent
    pub fn close(&mut self) {
        self.chunks.close();
    }
}

impl Stream for TtsStream {
    type Item = Result<AudioChunk, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.chunks).poll_next(cx)
    }
}

impl FusedStream for TtsStream {
    fn is_terminated(&self) -> bool {
        self.chunks.is_terminated()
    }
}

//! Text-to-speech client
//!
//! Mirrors [`crate::SttClient`]: batch synthesis falls back per call,
//! streamed synthesis only while the stream is being established. Text
//! input streams can be consumed once, so they are offered to the first
//! capable provider only.

use std::sync::Arc;
use std::time::Duration;

use speech::{
    SpeechError, StreamingTextToSpeech, SynthesisConfig, SynthesizedAudio, TextStream,
    TextToSpeech, VoiceInfo,
};
use tracing::{debug, field, instrument};

use crate::capability::{Capability, CapabilitySet, Modality};
use crate::client::{ClientCore, CoreBuilder};
use crate::config::RoutingConfig;
use crate::context::RequestContext;
use crate::error::ClientError;
use crate::ordering::{OrderSnapshot, ProviderOrder};
use crate::policy::{FailFast, FallbackPolicy};
use crate::registry::ProviderEntry;
use crate::session::TtsStream;

type TtsEntry = ProviderEntry<dyn TextToSpeech, dyn StreamingTextToSpeech>;

/// Builder for [`TtsClient`]
#[derive(Debug)]
pub struct TtsClientBuilder {
    core: CoreBuilder<dyn TextToSpeech, dyn StreamingTextToSpeech>,
}

impl TtsClientBuilder {
    /// Register a provider offering batch synthesis only
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_provider<P: TextToSpeech + 'static>(self, provider: P) -> Result<Self, ClientError> {
        self.with_shared_provider(Arc::new(provider))
    }

    /// Register an already shared batch provider
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_shared_provider(
        mut self,
        provider: Arc<dyn TextToSpeech>,
    ) -> Result<Self, ClientError> {
        let name = provider.name().to_string();
        self.core.register(TtsEntry::batch(name, provider))?;
        Ok(self)
    }

    /// Register a provider that also offers streamed synthesis
    ///
    /// Text-input streaming is recorded as a capability when the provider
    /// reports [`StreamingTextToSpeech::accepts_text_stream`].
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_streaming_provider<P: StreamingTextToSpeech + 'static>(
        mut self,
        provider: P,
    ) -> Result<Self, ClientError> {
        let provider = Arc::new(provider);
        let name = provider.name().to_string();
        let extra = if provider.accepts_text_stream() {
            CapabilitySet::TEXT_INPUT_STREAMING
        } else {
            CapabilitySet::empty()
        };
        let entry = TtsEntry::streaming(
            name,
            Arc::clone(&provider) as Arc<dyn TextToSpeech>,
            provider as Arc<dyn StreamingTextToSpeech>,
            extra,
        );
        self.core.register(entry)?;
        Ok(self)
    }

    /// Use an explicit ordering instead of registration order
    #[must_use]
    pub fn with_order(mut self, order: ProviderOrder) -> Self {
        self.core.set_order(order);
        self
    }

    /// Use a custom fallback policy
    #[must_use]
    pub fn with_policy(mut self, policy: impl FallbackPolicy + 'static) -> Self {
        self.core.set_policy(Arc::new(policy));
        self
    }

    /// Bound every provider attempt
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.core.set_attempt_timeout(Some(timeout));
        self
    }

    /// Apply ordering, policy and attempt timeout from configuration
    #[must_use]
    pub fn with_routing(mut self, routing: &RoutingConfig) -> Self {
        self.core.apply_routing(routing);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownProvider`] if the ordering names an
    /// unregistered primary.
    pub fn build(self) -> Result<TtsClient, ClientError> {
        Ok(TtsClient {
            core: self.core.build(Modality::Tts)?,
        })
    }
}

/// Text-to-speech with ordered provider fallback
#[derive(Debug)]
pub struct TtsClient {
    core: ClientCore<dyn TextToSpeech, dyn StreamingTextToSpeech>,
}

impl TtsClient {
    /// Start building a client
    #[must_use]
    pub fn builder() -> TtsClientBuilder {
        TtsClientBuilder {
            core: CoreBuilder::new(),
        }
    }

    /// Synthesize `text` into a complete audio buffer
    #[instrument(skip(self, ctx, text, config), fields(text_len = text.len(), provider = field::Empty))]
    pub async fn synthesize(
        &self,
        ctx: &RequestContext,
        text: &str,
        config: &SynthesisConfig,
    ) -> Result<SynthesizedAudio, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Batch, |entry| async move {
                entry.batch_handle().synthesize(text, config).await
            })
            .await?;
        Ok(dispatched.finish())
    }

    /// Synthesize `text` and stream the audio as it is produced
    #[instrument(skip(self, ctx, text, config), fields(text_len = text.len(), provider = field::Empty))]
    pub async fn synthesize_stream(
        &self,
        ctx: &RequestContext,
        text: &str,
        config: &SynthesisConfig,
    ) -> Result<TtsStream, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Streaming, |entry| async move {
                streaming_handle(&entry)?
                    .synthesize_stream(text, config)
                    .await
            })
            .await?;

        let provider = dispatched.provider.clone();
        let stream = TtsStream::new(provider, dispatched.finish());
        debug!(stream = %stream.id(), "Synthesis stream established");
        Ok(stream)
    }

    /// Synthesize text that arrives incrementally
    ///
    /// `text` is handed to the first provider in the ordering that accepts
    /// text input streams. If that provider fails to establish the stream,
    /// the request fails; the input cannot be replayed to another provider.
    #[instrument(skip(self, ctx, text, config), fields(provider = field::Empty))]
    pub async fn synthesize_text_stream(
        &self,
        ctx: &RequestContext,
        text: TextStream,
        config: &SynthesisConfig,
    ) -> Result<TtsStream, ClientError> {
        let snapshot = self.core.snapshot();
        let mut input = Some(text);
        let dispatched = self
            .core
            .dispatcher_with(&FailFast)
            .run(
                ctx,
                &snapshot.order,
                Capability::TextInputStreaming,
                |entry| {
                    let text = input.take();
                    async move {
                        let text = text.ok_or(SpeechError::StreamClosed)?;
                        streaming_handle(&entry)?
                            .synthesize_text_stream(text, config)
                            .await
                    }
                },
            )
            .await?;

        let provider = dispatched.provider.clone();
        let stream = TtsStream::new(provider, dispatched.finish());
        debug!(stream = %stream.id(), "Text-input synthesis stream established");
        Ok(stream)
    }

    /// Voices of every provider in the ordering
    ///
    /// Each voice is tagged with the provider offering it. Providers that
    /// fail to list their voices are left out; the call fails only if none
    /// succeeded.
    #[instrument(skip(self, ctx))]
    pub async fn list_voices(&self, ctx: &RequestContext) -> Result<Vec<VoiceInfo>, ClientError> {
        let snapshot = self.core.snapshot();
        let gathered = self
            .core
            .dispatcher()
            .gather(ctx, &snapshot.order, |entry| async move {
                entry.batch_handle().list_voices().await
            })
            .await?;

        let voices: Vec<VoiceInfo> = gathered
            .into_iter()
            .flat_map(|(provider, voices)| {
                voices.into_iter().map(move |mut voice| {
                    voice.provider.get_or_insert_with(|| provider.clone());
                    voice
                })
            })
            .collect();

        debug!(count = voices.len(), "Listed voices");
        Ok(voices)
    }

    /// Look up a voice, falling back across providers
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::VoiceNotFound`] if every attempted provider
    /// reported the voice as unknown.
    #[instrument(skip(self, ctx), fields(provider = field::Empty))]
    pub async fn get_voice(
        &self,
        ctx: &RequestContext,
        voice_id: &str,
    ) -> Result<VoiceInfo, ClientError> {
        let snapshot = self.core.snapshot();
        let result = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Batch, |entry| async move {
                let name = entry.name().to_string();
                let voice = entry.batch_handle().get_voice(voice_id).await?;
                Ok(if voice.provider.is_some() {
                    voice
                } else {
                    voice.with_provider(name)
                })
            })
            .await;

        match result {
            Ok(dispatched) => Ok(dispatched.finish()),
            Err(ClientError::NoAvailableProvider { report, .. })
                if report.failure_count() > 0
                    && report
                        .failures()
                        .all(|(_, err)| matches!(err, SpeechError::VoiceNotFound(_))) =>
            {
                Err(ClientError::VoiceNotFound(voice_id.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Make `name` the primary provider, keeping the fallbacks
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownProvider`] if `name` is not registered.
    pub fn set_primary(&self, name: &str) -> Result<(), ClientError> {
        self.core.set_primary(name)
    }

    /// Replace the fallbacks, keeping the primary
    ///
    /// Names are not checked; unregistered ones are skipped at call time.
    pub fn set_fallbacks<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core
            .set_fallbacks(names.into_iter().map(Into::into).collect());
    }

    /// Replace primary and fallbacks in one step
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownProvider`] if the primary is not
    /// registered.
    pub fn set_ordering(&self, order: ProviderOrder) -> Result<(), ClientError> {
        self.core.set_ordering(order)
    }

    /// Current ordering
    #[must_use]
    pub fn ordering(&self) -> ProviderOrder {
        self.core.snapshot().order.clone()
    }

    /// Current ordering with its generation
    #[must_use]
    pub fn ordering_snapshot(&self) -> Arc<OrderSnapshot> {
        self.core.snapshot()
    }

    /// Direct access to a provider, bypassing fallback
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<Arc<dyn TextToSpeech>> {
        self.core.entry(name).map(|e| Arc::clone(e.batch_handle()))
    }

    /// Direct access to a streaming provider, bypassing fallback
    #[must_use]
    pub fn streaming_provider(&self, name: &str) -> Option<Arc<dyn StreamingTextToSpeech>> {
        self.core
            .entry(name)
            .and_then(|e| e.streaming_handle().cloned())
    }

    /// Capabilities a provider declared at registration
    #[must_use]
    pub fn capabilities(&self, name: &str) -> Option<CapabilitySet> {
        self.core.capabilities(name)
    }

    /// Registered provider names, in registration order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.core.provider_names()
    }
}

fn streaming_handle(entry: &TtsEntry) -> Result<Arc<dyn StreamingTextToSpeech>, SpeechError> {
    entry
        .streaming_handle()
        .cloned()
        .ok_or_else(|| SpeechError::StreamingNotSupported(entry.name().to_string()))
}

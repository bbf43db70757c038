//! Speech-to-text client
//!
//! # Architecture
//!
//! ```text
//! Audio / file / URL
//!     │
//!     ▼
//! ┌───────────────────────────────────────┐
//! │              SttClient                │
//! │                                       │
//! │  ordering snapshot ──▶ candidates     │
//! │  ┌─────────┐   ┌──────────┐   ┌────┐  │
//! │  │ primary │──▶│fallback 1│──▶│ .. │  │
//! │  └─────────┘   └──────────┘   └────┘  │
//! └───────────────────────────────────────┘
//!     │
//!     ▼
//! Transcription / SttSession
//! ```
//!
//! Batch requests fall back per call. Streaming requests fall back only
//! while the session is being established.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use speech::{
    AudioData, SpeechError, SpeechToText, StreamingSpeechToText, Transcription,
    TranscriptionConfig,
};
use tracing::{debug, field, instrument};

use crate::capability::{Capability, CapabilitySet, Modality};
use crate::client::{ClientCore, CoreBuilder};
use crate::config::RoutingConfig;
use crate::context::RequestContext;
use crate::error::ClientError;
use crate::ordering::{OrderSnapshot, ProviderOrder};
use crate::policy::FallbackPolicy;
use crate::registry::ProviderEntry;
use crate::session::SttSession;

type SttEntry = ProviderEntry<dyn SpeechToText, dyn StreamingSpeechToText>;

/// Builder for [`SttClient`]
#[derive(Debug)]
pub struct SttClientBuilder {
    core: CoreBuilder<dyn SpeechToText, dyn StreamingSpeechToText>,
}

impl SttClientBuilder {
    /// Register a provider offering batch transcription only
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_provider<P: SpeechToText + 'static>(self, provider: P) -> Result<Self, ClientError> {
        self.with_shared_provider(Arc::new(provider))
    }

    /// Register an already shared batch provider
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_shared_provider(
        mut self,
        provider: Arc<dyn SpeechToText>,
    ) -> Result<Self, ClientError> {
        let name = provider.name().to_string();
        let entry = SttEntry::batch(name, provider);
        self.core.register(entry)?;
        Ok(self)
    }

    /// Register a provider that also offers streaming transcription
    ///
    /// # Errors
    ///
    /// Fails if the provider name is blank or already registered.
    pub fn with_streaming_provider<P: StreamingSpeechToText + 'static>(
        mut self,
        provider: P,
    ) -> Result<Self, ClientError> {
        let provider = Arc::new(provider);
        let name = provider.name().to_string();
        let entry = SttEntry::streaming(
            name,
            Arc::clone(&provider) as Arc<dyn SpeechToText>,
            provider as Arc<dyn StreamingSpeechToText>,
            CapabilitySet::empty(),
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
    pub fn build(self) -> Result<SttClient, ClientError> {
        Ok(SttClient {
            core: self.core.build(Modality::Stt)?,
        })
    }
}

/// Speech-to-text with ordered provider fallback
///
/// Safe to share between tasks; the ordering may be changed while requests
/// are in flight and each request uses one consistent ordering.
#[derive(Debug)]
pub struct SttClient {
    core: ClientCore<dyn SpeechToText, dyn StreamingSpeechToText>,
}

impl SttClient {
    /// Start building a client
    #[must_use]
    pub fn builder() -> SttClientBuilder {
        SttClientBuilder {
            core: CoreBuilder::new(),
        }
    }

    /// Transcribe a complete audio buffer
    #[instrument(
        skip(self, ctx, audio, config),
        fields(format = %audio.format(), size = audio.size_bytes(), provider = field::Empty)
    )]
    pub async fn transcribe(
        &self,
        ctx: &RequestContext,
        audio: AudioData,
        config: &TranscriptionConfig,
    ) -> Result<Transcription, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Batch, |entry| {
                let audio = audio.clone();
                async move { entry.batch_handle().transcribe(audio, config).await }
            })
            .await?;
        Ok(dispatched.finish())
    }

    /// Transcribe a local audio file
    #[instrument(
        skip(self, ctx, path, config),
        fields(path = %path.display(), provider = field::Empty)
    )]
    pub async fn transcribe_file(
        &self,
        ctx: &RequestContext,
        path: &Path,
        config: &TranscriptionConfig,
    ) -> Result<Transcription, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Batch, |entry| async move {
                entry.batch_handle().transcribe_file(path, config).await
            })
            .await?;
        Ok(dispatched.finish())
    }

    /// Transcribe audio the provider fetches from `url`
    #[instrument(skip(self, ctx, config), fields(provider = field::Empty))]
    pub async fn transcribe_url(
        &self,
        ctx: &RequestContext,
        url: &str,
        config: &TranscriptionConfig,
    ) -> Result<Transcription, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Batch, |entry| async move {
                entry.batch_handle().transcribe_url(url, config).await
            })
            .await?;
        Ok(dispatched.finish())
    }

    /// Open a streaming transcription session
    ///
    /// Candidates without streaming support are skipped. Once a provider
    /// accepts the session it serves it until the end; its failures are
    /// reported on the session's event stream.
    #[instrument(skip(self, ctx, config), fields(provider = field::Empty))]
    pub async fn transcribe_stream(
        &self,
        ctx: &RequestContext,
        config: &TranscriptionConfig,
    ) -> Result<SttSession, ClientError> {
        let snapshot = self.core.snapshot();
        let dispatched = self
            .core
            .dispatcher()
            .run(ctx, &snapshot.order, Capability::Streaming, |entry| async move {
                let provider = entry
                    .streaming_handle()
                    .cloned()
                    .ok_or_else(|| SpeechError::StreamingNotSupported(entry.name().to_string()))?;
                provider.transcribe_stream(config).await
            })
            .await?;

        let provider = dispatched.provider.clone();
        let stream = dispatched.finish();
        let session = SttSession::new(provider, stream.sink, stream.events);
        debug!(session = %session.id(), "Streaming session established");
        Ok(session)
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
    pub fn provider(&self, name: &str) -> Option<Arc<dyn SpeechToText>> {
        self.core.entry(name).map(|e| Arc::clone(e.batch_handle()))
    }

    /// Direct access to a streaming provider, bypassing fallback
    #[must_use]
    pub fn streaming_provider(&self, name: &str) -> Option<Arc<dyn StreamingSpeechToText>> {
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

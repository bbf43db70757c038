//! Provider-fallback orchestration for speech providers
//!
//! Holds named STT and TTS providers, orders them as a primary plus
//! fallbacks and runs each request against that order:
//!
//! - Batch requests try candidates one by one until one succeeds
//! - Streaming requests skip providers without streaming support and fall
//!   back only while the session is being established
//! - A pluggable [`FallbackPolicy`] decides whether a failure moves on to
//!   the next candidate
//! - The caller's [`RequestContext`] stops the chain on cancellation or
//!   deadline
//!
//! # Example
//!
//! ```ignore
//! use orchestration::{ProviderOrder, RequestContext, SttClient};
//!
//! let client = SttClient::builder()
//!     .with_streaming_provider(deepgram)?
//!     .with_provider(whisper)?
//!     .with_order(ProviderOrder::new("deepgram", ["whisper"]))
//!     .build()?;
//!
//! let transcription = client
//!     .transcribe(&RequestContext::new(), audio, &TranscriptionConfig::default())
//!     .await?;
//! ```

pub mod capability;
mod client;
pub mod config;
pub mod context;
mod dispatch;
pub mod error;
pub mod ordering;
pub mod policy;
pub mod registry;
pub mod report;
pub mod session;
pub mod stt;
pub mod tts;

pub use capability::{Capability, CapabilitySet, Modality};
pub use config::{OrchestrationConfig, RoutingConfig};
pub use context::{CancelReason, RequestContext};
pub use error::{ClientError, RegistryError};
pub use ordering::{OrderSnapshot, OrderingState, ProviderOrder};
pub use policy::{
    AlwaysFallback, FailFast, FailureAction, FallbackPolicy, PolicyKind, StopOnInputError,
};
pub use registry::{ProviderEntry, ProviderRegistry};
pub use report::{Attempt, AttemptOutcome, AttemptReport};
pub use session::{SessionStream, SttSession, TtsStream};
pub use stt::{SttClient, SttClientBuilder};
pub use tts::{TtsClient, TtsClientBuilder};

pub use tokio_util::sync::CancellationToken;

//! Structured logging setup
//!
//! Installs a `tracing` subscriber with an `EnvFilter` that can be swapped
//! at runtime through the returned [`TelemetryGuard`].

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Configuration for logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directives (e.g., "info", "orchestration=debug,telephony=info")
    ///
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Include thread ids in each line
    #[serde(default)]
    pub thread_ids: bool,
}

fn default_log_filter() -> String {
    "info,orchestration=info,telephony=info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
            thread_ids: false,
        }
    }
}

impl TelemetryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        EnvFilter::try_new(&self.log_filter)
            .map(|_| ())
            .map_err(|e| format!("invalid log_filter '{}': {e}", self.log_filter))
    }
}

/// Handle to the installed subscriber
///
/// Keep it alive for the duration of the application; it is needed to
/// change the log filter at runtime.
pub struct TelemetryGuard {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard").finish_non_exhaustive()
    }
}

impl TelemetryGuard {
    /// Replace the active filter directives
    pub fn set_filter(&self, directives: &str) -> Result<(), TelemetryError> {
        let filter =
            EnvFilter::try_new(directives).map_err(|e| TelemetryError::Filter(e.to_string()))?;
        self.filter
            .reload(filter)
            .map_err(|e| TelemetryError::Filter(e.to_string()))?;
        info!(filter = directives, "Log filter updated");
        Ok(())
    }
}

/// Initialize logging with the given configuration
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```ignore
/// use infrastructure::telemetry::{TelemetryConfig, init_telemetry};
///
/// let _guard = init_telemetry(&TelemetryConfig::default())?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;
    let (filter_layer, filter) = reload::Layer::new(env_filter);

    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(config.thread_ids)
            .with_file(true)
            .with_line_number(true)
    });
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(config.thread_ids)
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(json = config.json, "Telemetry initialized");
    Ok(TelemetryGuard { filter })
}

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),

    /// Invalid filter directives
    #[error("Invalid log filter: {0}")]
    Filter(String),
}

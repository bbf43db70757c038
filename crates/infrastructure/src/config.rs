//! Application configuration
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config.toml` (optional)
//! 3. Environment variables prefixed `VOICEBRIDGE`, nested with `__`
//!    (e.g. `VOICEBRIDGE__ORCHESTRATION__STT__PRIMARY=deepgram`)

use std::path::Path;

use orchestration::OrchestrationConfig;
use serde::{Deserialize, Serialize};
use telephony::TransportConfig;
use thiserror::Error;

use crate::telemetry::TelemetryConfig;

const ENV_PREFIX: &str = "VOICEBRIDGE";

/// Keys read as comma-separated lists from the environment
const LIST_KEYS: [&str; 2] = [
    "orchestration.stt.fallbacks",
    "orchestration.tts.fallbacks",
];

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are not acceptable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider routing for STT and TTS
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Default audio transport parameters
    #[serde(default)]
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(config::File::with_name("config").required(false))
    }

    /// Load from an explicit file and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file(config::File::from(path).required(true))
    }

    fn from_file(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<Self, ConfigError> {
        let mut environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.orchestration
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("orchestration.{e}")))?;
        self.telemetry
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("telemetry: {e}")))?;
        self.transport
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("transport: {e}")))
    }
}

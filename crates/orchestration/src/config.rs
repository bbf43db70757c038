//! Routing configuration for the clients

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ordering::ProviderOrder;
use crate::policy::{FallbackPolicy, PolicyKind};

/// Routing for both modalities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Speech-to-text routing
    #[serde(default)]
    pub stt: RoutingConfig,

    /// Text-to-speech routing
    #[serde(default)]
    pub tts: RoutingConfig,
}

impl OrchestrationConfig {
    /// Validate both routings
    pub fn validate(&self) -> Result<(), String> {
        self.stt.validate().map_err(|e| format!("stt: {e}"))?;
        self.tts.validate().map_err(|e| format!("tts: {e}"))
    }
}

/// Routing of one modality
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// First provider attempted; `None` keeps the registration default
    #[serde(default)]
    pub primary: Option<String>,

    /// Providers attempted after the primary, in order
    #[serde(default)]
    pub fallbacks: Vec<String>,

    /// Reaction to provider failures
    #[serde(default)]
    pub policy: PolicyKind,

    /// Upper bound for a single provider attempt
    #[serde(default)]
    pub attempt_timeout_ms: Option<u64>,
}

impl RoutingConfig {
    /// Validate the routing
    pub fn validate(&self) -> Result<(), String> {
        if self.primary.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err("Primary provider name must not be blank".to_string());
        }

        if self.fallbacks.iter().any(|f| f.trim().is_empty()) {
            return Err("Fallback provider names must not be blank".to_string());
        }

        if self.attempt_timeout_ms == Some(0) {
            return Err("Attempt timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Whether an explicit ordering is configured
    #[must_use]
    pub fn has_order(&self) -> bool {
        self.primary.is_some() || !self.fallbacks.is_empty()
    }

    /// Configured ordering
    #[must_use]
    pub fn to_order(&self) -> ProviderOrder {
        ProviderOrder {
            primary: self.primary.clone(),
            fallbacks: self.fallbacks.clone(),
        }
    }

    /// Configured policy
    #[must_use]
    pub fn policy(&self) -> Arc<dyn FallbackPolicy> {
        self.policy.build()
    }

    /// Configured attempt timeout
    #[must_use]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

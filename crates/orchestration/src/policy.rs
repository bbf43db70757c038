//! Fallback policies
//!
//! A policy is consulted after each provider failure and decides whether
//! the next candidate is tried. Capability skips never reach the policy.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use speech::SpeechError;

/// Decision taken after a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Continue with the next candidate
    TryNext,
    /// Stop the chain
    Abort,
}

/// Decides how the resolution loop reacts to provider failures
#[cfg_attr(test, mockall::automock)]
pub trait FallbackPolicy: Send + Sync + fmt::Debug {
    /// React to `error` returned by `provider`
    fn on_failure(&self, provider: &str, error: &SpeechError) -> FailureAction;
}

/// Always try the next candidate, whatever the failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFallback;

impl FallbackPolicy for AlwaysFallback {
    fn on_failure(&self, _provider: &str, _error: &SpeechError) -> FailureAction {
        FailureAction::TryNext
    }
}

/// Stop on failures caused by the request itself
///
/// Malformed audio or a rejected config fails the same way on every
/// provider; everything else falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOnInputError;

impl FallbackPolicy for StopOnInputError {
    fn on_failure(&self, _provider: &str, error: &SpeechError) -> FailureAction {
        if error.is_input_error() {
            FailureAction::Abort
        } else {
            FailureAction::TryNext
        }
    }
}

/// Never fall back after a provider was invoked
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl FallbackPolicy for FailFast {
    fn on_failure(&self, _provider: &str, _error: &SpeechError) -> FailureAction {
        FailureAction::Abort
    }
}

/// Configurable policy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// [`AlwaysFallback`]
    #[default]
    Always,
    /// [`StopOnInputError`]
    StopOnInputError,
    /// [`FailFast`]
    FailFast,
}

impl PolicyKind {
    /// Instantiate the selected policy
    #[must_use]
    pub fn build(self) -> Arc<dyn FallbackPolicy> {
        match self {
            Self::Always => Arc::new(AlwaysFallback),
            Self::StopOnInputError => Arc::new(StopOnInputError),
            Self::FailFast => Arc::new(FailFast),
        }
    }
}

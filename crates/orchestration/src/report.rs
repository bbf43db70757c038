//! Per-request diagnostics

use std::fmt;

use speech::SpeechError;

use crate::capability::Capability;

/// What happened to one candidate
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// The provider was invoked and returned an error
    Failed(SpeechError),
    /// The provider lacks a capability the request needs and was not invoked
    Skipped(Capability),
}

/// One candidate considered during resolution
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Provider name
    pub provider: String,
    /// Outcome
    pub outcome: AttemptOutcome,
}

/// Ordered record of every unsuccessful candidate of a request
#[derive(Debug, Clone, Default)]
pub struct AttemptReport {
    attempts: Vec<Attempt>,
}

impl AttemptReport {
    /// Record a provider execution failure
    pub fn record_failure(&mut self, provider: impl Into<String>, error: SpeechError) {
        self.attempts.push(Attempt {
            provider: provider.into(),
            outcome: AttemptOutcome::Failed(error),
        });
    }

    /// Record a capability mismatch
    pub fn record_skip(&mut self, provider: impl Into<String>, missing: Capability) {
        self.attempts.push(Attempt {
            provider: provider.into(),
            outcome: AttemptOutcome::Skipped(missing),
        });
    }

    /// All entries in the order they happened
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Provider failures, in order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SpeechError)> {
        self.attempts.iter().filter_map(|a| match &a.outcome {
            AttemptOutcome::Failed(err) => Some((a.provider.as_str(), err)),
            AttemptOutcome::Skipped(_) => None,
        })
    }

    /// Number of providers that were invoked and failed
    ///
    /// Capability skips are not counted.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Number of candidates skipped for a missing capability
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.attempts.len() - self.failure_count()
    }

    /// Names of the providers that were invoked, in order
    #[must_use]
    pub fn attempted_providers(&self) -> Vec<&str> {
        self.failures().map(|(name, _)| name).collect()
    }

    /// Most recent provider failure
    #[must_use]
    pub fn last_error(&self) -> Option<&SpeechError> {
        self.failures().last().map(|(_, err)| err)
    }

    /// Whether no candidate was considered at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl fmt::Display for AttemptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no candidates");
        }

        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            match &attempt.outcome {
                AttemptOutcome::Failed(err) => write!(f, "{}: {err}", attempt.provider)?,
                AttemptOutcome::Skipped(capability) => {
                    write!(f, "{}: skipped, no {capability} support", attempt.provider)?;
                }
            }
        }
        Ok(())
    }
}

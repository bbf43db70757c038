//! Resolution loop shared by both clients
//!
//! Walks the candidate order of one ordering snapshot, skips providers
//! lacking the required capability, invokes the rest one at a time and
//! consults the policy after each failure. The caller's context is checked
//! before every attempt and raced against the attempt itself.

use std::future::Future;
use std::time::Duration;

use speech::SpeechError;
use tracing::{Span, debug, info, warn};

use crate::capability::{Capability, Modality};
use crate::context::{CancelReason, RequestContext};
use crate::error::ClientError;
use crate::ordering::ProviderOrder;
use crate::policy::{FailureAction, FallbackPolicy};
use crate::registry::{ProviderEntry, ProviderRegistry};
use crate::report::AttemptReport;

/// Successful resolution
#[derive(Debug)]
pub(crate) struct Dispatched<T> {
    /// Provider that produced the value
    pub provider: String,
    pub value: T,
    /// Failures and skips that preceded the success
    pub report: AttemptReport,
}

impl<T> Dispatched<T> {
    /// Record the serving provider on the current span and unwrap the value
    pub fn finish(self) -> T {
        Span::current().record("provider", self.provider.as_str());
        if !self.report.is_empty() {
            debug!(report = %self.report, "Recovered after unsuccessful candidates");
        }
        self.value
    }
}

enum AttemptError {
    Provider(SpeechError),
    Cancelled(CancelReason),
}

pub(crate) struct Dispatcher<'a, B: ?Sized, S: ?Sized> {
    pub modality: Modality,
    pub registry: &'a ProviderRegistry<B, S>,
    pub policy: &'a dyn FallbackPolicy,
    pub attempt_timeout: Option<Duration>,
}

impl<B: ?Sized, S: ?Sized> Dispatcher<'_, B, S> {
    /// Run `attempt` against the candidates of `order` until one succeeds
    ///
    /// Unregistered names are dropped before iteration. If `required` is a
    /// streaming tier and no registered candidate offers it, fails with
    /// [`ClientError::StreamingNotSupported`] without invoking anyone.
    pub async fn run<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        order: &ProviderOrder,
        required: Capability,
        mut attempt: F,
    ) -> Result<Dispatched<T>, ClientError>
    where
        F: FnMut(ProviderEntry<B, S>) -> Fut,
        Fut: Future<Output = Result<T, SpeechError>>,
    {
        let candidates = self.resolve(order);
        let mut report = AttemptReport::default();

        if candidates.is_empty() {
            warn!(modality = %self.modality, "No registered provider in ordering");
            return Err(self.exhausted(report));
        }

        if required != Capability::Batch
            && !candidates
                .iter()
                .any(|entry| entry.capabilities().supports(required))
        {
            warn!(
                modality = %self.modality,
                capability = %required,
                "No provider in ordering supports the required capability"
            );
            return Err(ClientError::StreamingNotSupported(self.modality));
        }

        for entry in candidates {
            if let Some(reason) = ctx.is_done() {
                return Err(self.cancelled(reason, report));
            }

            if !entry.capabilities().supports(required) {
                debug!(
                    provider = entry.name(),
                    capability = %required,
                    "Skipping provider without required capability"
                );
                report.record_skip(entry.name(), required);
                continue;
            }

            debug!(provider = entry.name(), modality = %self.modality, "Attempting provider");
            let name = entry.name().to_string();

            match self.attempt(ctx, attempt(entry.clone())).await {
                Ok(value) => {
                    if report.is_empty() {
                        info!(provider = %name, modality = %self.modality, "Provider succeeded");
                    } else {
                        info!(
                            provider = %name,
                            modality = %self.modality,
                            failed = report.failure_count(),
                            "Provider succeeded (fallback)"
                        );
                    }
                    return Ok(Dispatched {
                        provider: name,
                        value,
                        report,
                    });
                }
                Err(AttemptError::Cancelled(reason)) => {
                    return Err(self.cancelled(reason, report));
                }
                Err(AttemptError::Provider(err)) => {
                    warn!(provider = %name, modality = %self.modality, "Provider failed: {err}");
                    let action = self.policy.on_failure(&name, &err);
                    report.record_failure(name, err);
                    if action == FailureAction::Abort {
                        warn!(modality = %self.modality, "Fallback policy stopped the chain");
                        break;
                    }
                }
            }
        }

        Err(self.exhausted(report))
    }

    /// Run `call` against every registered candidate and collect successes
    ///
    /// Failures are recorded and never stop the walk, so the policy is not
    /// consulted. Fails if the context ends or no candidate succeeded.
    pub async fn gather<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        order: &ProviderOrder,
        mut call: F,
    ) -> Result<Vec<(String, T)>, ClientError>
    where
        F: FnMut(ProviderEntry<B, S>) -> Fut,
        Fut: Future<Output = Result<T, SpeechError>>,
    {
        let mut report = AttemptReport::default();
        let mut gathered = Vec::new();

        for entry in self.resolve(order) {
            if let Some(reason) = ctx.is_done() {
                return Err(self.cancelled(reason, report));
            }

            let name = entry.name().to_string();
            match self.attempt(ctx, call(entry.clone())).await {
                Ok(value) => gathered.push((name, value)),
                Err(AttemptError::Cancelled(reason)) => {
                    return Err(self.cancelled(reason, report));
                }
                Err(AttemptError::Provider(err)) => {
                    warn!(provider = %name, modality = %self.modality, "Provider failed: {err}");
                    report.record_failure(name, err);
                }
            }
        }

        if gathered.is_empty() {
            return Err(self.exhausted(report));
        }
        Ok(gathered)
    }

    /// Registered candidates of `order`, in order
    pub fn resolve(&self, order: &ProviderOrder) -> Vec<&ProviderEntry<B, S>> {
        order
            .candidates()
            .into_iter()
            .filter_map(|name| {
                let entry = self.registry.lookup(name);
                if entry.is_none() {
                    debug!(provider = name, "Skipping unregistered provider");
                }
                entry
            })
            .collect()
    }

    async fn attempt<T>(
        &self,
        ctx: &RequestContext,
        call: impl Future<Output = Result<T, SpeechError>>,
    ) -> Result<T, AttemptError> {
        let bounded = async {
            match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or_else(|_| {
                        Err(SpeechError::Timeout(
                            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        ))
                    }),
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            reason = ctx.done() => Err(AttemptError::Cancelled(reason)),
            result = bounded => result.map_err(AttemptError::Provider),
        }
    }

    fn exhausted(&self, report: AttemptReport) -> ClientError {
        ClientError::NoAvailableProvider {
            modality: self.modality,
            report,
        }
    }

    fn cancelled(&self, reason: CancelReason, report: AttemptReport) -> ClientError {
        warn!(
            modality = %self.modality,
            %reason,
            attempted = report.failure_count(),
            "Request abandoned, not trying remaining providers"
        );
        ClientError::Cancelled {
            modality: self.modality,
            reason,
            report,
        }
    }
}

//! State shared by the STT and TTS clients

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::capability::{CapabilitySet, Modality};
use crate::config::RoutingConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::ordering::{OrderSnapshot, OrderingState, ProviderOrder};
use crate::policy::{AlwaysFallback, FallbackPolicy};
use crate::registry::{ProviderEntry, ProviderRegistry};

/// Registry, ordering and policy of one client
pub(crate) struct ClientCore<B: ?Sized, S: ?Sized> {
    modality: Modality,
    registry: ProviderRegistry<B, S>,
    ordering: OrderingState,
    policy: Arc<dyn FallbackPolicy>,
    attempt_timeout: Option<Duration>,
}

impl<B: ?Sized, S: ?Sized> ClientCore<B, S> {
    pub fn dispatcher(&self) -> Dispatcher<'_, B, S> {
        self.dispatcher_with(self.policy.as_ref())
    }

    pub fn dispatcher_with<'a>(&'a self, policy: &'a dyn FallbackPolicy) -> Dispatcher<'a, B, S> {
        Dispatcher {
            modality: self.modality,
            registry: &self.registry,
            policy,
            attempt_timeout: self.attempt_timeout,
        }
    }

    pub fn snapshot(&self) -> Arc<OrderSnapshot> {
        self.ordering.load()
    }

    pub fn set_primary(&self, name: &str) -> Result<(), ClientError> {
        self.ensure_registered(name)?;
        let snapshot = self.ordering.set_primary(name);
        info!(
            modality = %self.modality,
            primary = name,
            generation = snapshot.generation,
            "Primary provider changed"
        );
        Ok(())
    }

    pub fn set_fallbacks(&self, fallbacks: Vec<String>) {
        let snapshot = self.ordering.set_fallbacks(&fallbacks);
        info!(
            modality = %self.modality,
            fallbacks = ?fallbacks,
            generation = snapshot.generation,
            "Fallback providers changed"
        );
    }

    pub fn set_ordering(&self, order: ProviderOrder) -> Result<(), ClientError> {
        if let Some(primary) = &order.primary {
            self.ensure_registered(primary)?;
        }
        let snapshot = self.ordering.replace(order);
        info!(
            modality = %self.modality,
            primary = ?snapshot.order.primary,
            fallbacks = ?snapshot.order.fallbacks,
            generation = snapshot.generation,
            "Provider ordering replaced"
        );
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&ProviderEntry<B, S>> {
        self.registry.lookup(name)
    }

    pub fn capabilities(&self, name: &str) -> Option<CapabilitySet> {
        self.entry(name).map(ProviderEntry::capabilities)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.registry.names().collect()
    }

    fn ensure_registered(&self, name: &str) -> Result<(), ClientError> {
        if self.registry.contains(name) {
            Ok(())
        } else {
            Err(ClientError::UnknownProvider(name.to_string()))
        }
    }
}

impl<B: ?Sized, S: ?Sized> fmt::Debug for ClientCore<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCore")
            .field("modality", &self.modality)
            .field("registry", &self.registry)
            .field("ordering", &self.ordering.load().order)
            .field("policy", &self.policy)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

/// Collects providers and routing before a client is built
pub(crate) struct CoreBuilder<B: ?Sized, S: ?Sized> {
    registry: ProviderRegistry<B, S>,
    order: Option<ProviderOrder>,
    /// Fallbacks configured without a primary
    fallbacks: Option<Vec<String>>,
    policy: Arc<dyn FallbackPolicy>,
    attempt_timeout: Option<Duration>,
}

impl<B: ?Sized, S: ?Sized> CoreBuilder<B, S> {
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::new(),
            order: None,
            fallbacks: None,
            policy: Arc::new(AlwaysFallback),
            attempt_timeout: None,
        }
    }

    pub fn register(&mut self, entry: ProviderEntry<B, S>) -> Result<(), ClientError> {
        self.registry.register(entry)?;
        Ok(())
    }

    pub fn set_order(&mut self, order: ProviderOrder) {
        self.order = Some(order);
        self.fallbacks = None;
    }

    pub fn set_policy(&mut self, policy: Arc<dyn FallbackPolicy>) {
        self.policy = policy;
    }

    pub fn set_attempt_timeout(&mut self, timeout: Option<Duration>) {
        self.attempt_timeout = timeout;
    }

    /// Take over a routing section
    ///
    /// Fallbacks configured without a primary replace only the fallbacks of
    /// the ordering in effect at build time.
    pub fn apply_routing(&mut self, routing: &RoutingConfig) {
        if routing.primary.is_some() {
            self.set_order(routing.to_order());
        } else if routing.has_order() {
            self.fallbacks = Some(routing.fallbacks.clone());
        }
        self.policy = routing.policy();
        self.attempt_timeout = routing.attempt_timeout();
    }

    /// Finish the client
    ///
    /// Without an explicit ordering, the first registered provider becomes
    /// the primary and the rest are fallbacks in registration order.
    pub fn build(self, modality: Modality) -> Result<ClientCore<B, S>, ClientError> {
        let mut order = self.order.unwrap_or_else(|| {
            let mut names = self.registry.names().map(str::to_string);
            ProviderOrder {
                primary: names.next(),
                fallbacks: names.collect(),
            }
        });
        if let Some(fallbacks) = self.fallbacks {
            order.fallbacks = fallbacks;
        }

        if let Some(primary) = order
            .primary
            .as_ref()
            .filter(|name| !self.registry.contains(name))
        {
            return Err(ClientError::UnknownProvider(primary.clone()));
        }

        info!(
            %modality,
            providers = self.registry.len(),
            primary = ?order.primary,
            fallbacks = ?order.fallbacks,
            "Client initialized"
        );

        Ok(ClientCore {
            modality,
            registry: self.registry,
            ordering: OrderingState::new(order),
            policy: self.policy,
            attempt_timeout: self.attempt_timeout,
        })
    }
}

impl<B: ?Sized, S: ?Sized> fmt::Debug for CoreBuilder<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreBuilder")
            .field("registry", &self.registry)
            .field("order", &self.order)
            .field("fallbacks", &self.fallbacks)
            .field("policy", &self.policy)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

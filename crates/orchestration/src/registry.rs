//! Provider registry
//!
//! An in-memory map from provider name to provider handles. Each entry
//! keeps one handle per capability tier so dispatch can pick the right
//! trait object without downcasting.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::capability::CapabilitySet;
use crate::error::RegistryError;

/// A registered provider
///
/// `B` is the base trait object of the modality and `S` its streaming
/// extension. `streaming` is set exactly when `capabilities` contains
/// [`CapabilitySet::STREAMING`].
pub struct ProviderEntry<B: ?Sized, S: ?Sized> {
    name: String,
    batch: Arc<B>,
    streaming: Option<Arc<S>>,
    capabilities: CapabilitySet,
}

impl<B: ?Sized, S: ?Sized> ProviderEntry<B, S> {
    /// Entry for a provider offering only the base contract
    pub fn batch(name: impl Into<String>, batch: Arc<B>) -> Self {
        Self {
            name: name.into(),
            batch,
            streaming: None,
            capabilities: CapabilitySet::BATCH,
        }
    }

    /// Entry for a provider offering the streaming extension
    ///
    /// `extra` adds tiers beyond batch and streaming.
    pub fn streaming(
        name: impl Into<String>,
        batch: Arc<B>,
        streaming: Arc<S>,
        extra: CapabilitySet,
    ) -> Self {
        Self {
            name: name.into(),
            batch,
            streaming: Some(streaming),
            capabilities: CapabilitySet::BATCH | CapabilitySet::STREAMING | extra,
        }
    }

    /// Provider name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base contract handle
    #[must_use]
    pub const fn batch_handle(&self) -> &Arc<B> {
        &self.batch
    }

    /// Streaming handle, if the provider supports streaming
    #[must_use]
    pub const fn streaming_handle(&self) -> Option<&Arc<S>> {
        self.streaming.as_ref()
    }

    /// Declared capabilities
    #[must_use]
    pub const fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}

impl<B: ?Sized, S: ?Sized> Clone for ProviderEntry<B, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            batch: Arc::clone(&self.batch),
            streaming: self.streaming.clone(),
            capabilities: self.capabilities,
        }
    }
}

impl<B: ?Sized, S: ?Sized> fmt::Debug for ProviderEntry<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Named providers of one modality
pub struct ProviderRegistry<B: ?Sized, S: ?Sized> {
    entries: HashMap<String, ProviderEntry<B, S>>,
    registration_order: Vec<String>,
}

impl<B: ?Sized, S: ?Sized> ProviderRegistry<B, S> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            registration_order: Vec::new(),
        }
    }

    /// Add a provider under its own name
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyName`] for a blank name and
    /// [`RegistryError::Duplicate`] if the name is already taken.
    pub fn register(&mut self, entry: ProviderEntry<B, S>) -> Result<(), RegistryError> {
        if entry.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.entries.contains_key(&entry.name) {
            return Err(RegistryError::Duplicate(entry.name));
        }

        debug!(
            provider = %entry.name,
            capabilities = ?entry.capabilities,
            "Registered provider"
        );
        self.registration_order.push(entry.name.clone());
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Add or overwrite a provider, returning the previous entry
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyName`] for a blank name.
    pub fn replace(
        &mut self,
        entry: ProviderEntry<B, S>,
    ) -> Result<Option<ProviderEntry<B, S>>, RegistryError> {
        if entry.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let name = entry.name.clone();
        let previous = self.entries.insert(name.clone(), entry);
        if previous.is_none() {
            self.registration_order.push(name);
        } else {
            debug!(provider = %name, "Replaced provider");
        }
        Ok(previous)
    }

    /// Resolve a provider by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ProviderEntry<B, S>> {
        self.entries.get(name)
    }

    /// Whether a provider is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registration_order.iter().map(String::as_str)
    }

    /// Number of providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: ?Sized, S: ?Sized> Default for ProviderRegistry<B, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized, S: ?Sized> fmt::Debug for ProviderRegistry<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.registration_order)
            .finish()
    }
}

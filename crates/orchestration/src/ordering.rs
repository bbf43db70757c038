//! Provider ordering
//!
//! The ordering lives apart from the registry and is published as an
//! immutable snapshot. Writers build a whole new snapshot and swap it in, so
//! a reader always sees a primary and a fallback list from the same
//! generation.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Primary plus ordered fallbacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOrder {
    /// First provider attempted
    pub primary: Option<String>,
    /// Providers attempted after the primary, in order
    pub fallbacks: Vec<String>,
}

impl ProviderOrder {
    /// Ordering with a primary and fallbacks
    pub fn new<I, S>(primary: impl Into<String>, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary: Some(primary.into()),
            fallbacks: fallbacks.into_iter().map(Into::into).collect(),
        }
    }

    /// Candidate names: primary first, then fallbacks
    ///
    /// A name listed more than once keeps only its first position.
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.primary
            .iter()
            .chain(&self.fallbacks)
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Whether the ordering names no provider
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallbacks.is_empty()
    }
}

/// One published ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    /// Incremented on every write
    pub generation: u64,
    /// The ordering itself
    pub order: ProviderOrder,
}

/// Copy-on-write holder of the current ordering
#[derive(Debug)]
pub struct OrderingState {
    current: ArcSwap<OrderSnapshot>,
}

impl OrderingState {
    /// Publish an initial ordering as generation 0
    #[must_use]
    pub fn new(order: ProviderOrder) -> Self {
        Self {
            current: ArcSwap::from_pointee(OrderSnapshot {
                generation: 0,
                order,
            }),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn load(&self) -> Arc<OrderSnapshot> {
        self.current.load_full()
    }

    /// Replace the whole ordering
    pub fn replace(&self, order: ProviderOrder) -> Arc<OrderSnapshot> {
        self.update(|_| order.clone())
    }

    /// Change only the primary, keeping the current fallbacks
    pub fn set_primary(&self, primary: &str) -> Arc<OrderSnapshot> {
        self.update(|current| ProviderOrder {
            primary: Some(primary.to_string()),
            fallbacks: current.fallbacks.clone(),
        })
    }

    /// Change only the fallbacks, keeping the current primary
    pub fn set_fallbacks(&self, fallbacks: &[String]) -> Arc<OrderSnapshot> {
        self.update(|current| ProviderOrder {
            primary: current.primary.clone(),
            fallbacks: fallbacks.to_vec(),
        })
    }

    fn update(&self, f: impl Fn(&ProviderOrder) -> ProviderOrder) -> Arc<OrderSnapshot> {
        // rcu retries on contention, so concurrent partial updates compose
        self.current.rcu(|current| OrderSnapshot {
            generation: current.generation + 1,
            order: f(&current.order),
        });
        self.load()
    }
}

impl Default for OrderingState {
    fn default() -> Self {
        Self::new(ProviderOrder::default())
    }
}

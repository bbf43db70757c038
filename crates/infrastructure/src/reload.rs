//! Hot-reloadable configuration
//!
//! Holds the current [`AppConfig`] behind an `ArcSwap` and notifies
//! subscribers on every change. Routing changes can be pushed into running
//! clients; each client swaps its whole ordering in one step.

use std::sync::Arc;

use arc_swap::ArcSwap;
use orchestration::{ClientError, ProviderOrder, RoutingConfig, SttClient, TtsClient};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, ConfigError};

/// A wrapper around `AppConfig` that supports atomic replacement
#[derive(Debug, Clone)]
pub struct ReloadableConfig {
    inner: Arc<ArcSwap<AppConfig>>,
    /// Notifier for config change events
    notify: watch::Sender<u64>,
    /// Receiver for config change events
    receiver: watch::Receiver<u64>,
}

impl ReloadableConfig {
    /// Create a new reloadable configuration
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let (notify, receiver) = watch::channel(0);
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(config))),
            notify,
            receiver,
        }
    }

    /// Get the current configuration
    #[must_use]
    pub fn load(&self) -> Arc<AppConfig> {
        self.inner.load_full()
    }

    /// Validate and publish a new configuration
    ///
    /// Returns the new version number. An invalid configuration is rejected
    /// and the current one stays in place.
    pub fn replace(&self, config: AppConfig) -> Result<u64, ConfigError> {
        config.validate()?;
        self.inner.store(Arc::new(config));

        let mut version = 0;
        self.notify.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        info!(version, "Configuration replaced");
        Ok(version)
    }

    /// Reload configuration from disk and the environment
    ///
    /// Returns `true` if the reload was successful
    pub fn reload(&self) -> bool {
        match AppConfig::load().and_then(|config| self.replace(config)) {
            Ok(version) => {
                info!(version, "Configuration reloaded successfully");
                true
            }
            Err(e) => {
                error!("Failed to reload configuration: {e}");
                false
            }
        }
    }

    /// Subscribe to configuration change notifications
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    /// Push the current routing into both clients
    ///
    /// Modalities without a configured ordering are left untouched. Without
    /// a configured primary only the fallbacks are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownProvider`] if a configured primary is
    /// not registered with its client. The other client is still updated.
    pub fn apply_routing(&self, stt: &SttClient, tts: &TtsClient) -> Result<(), ClientError> {
        let config = self.load();
        let stt_result = apply(
            &config.orchestration.stt,
            |order| stt.set_ordering(order),
            |fallbacks| stt.set_fallbacks(fallbacks),
        );
        let tts_result = apply(
            &config.orchestration.tts,
            |order| tts.set_ordering(order),
            |fallbacks| tts.set_fallbacks(fallbacks),
        );
        stt_result.and(tts_result)
    }
}

fn apply(
    routing: &RoutingConfig,
    set_ordering: impl FnOnce(ProviderOrder) -> Result<(), ClientError>,
    set_fallbacks: impl FnOnce(Vec<String>),
) -> Result<(), ClientError> {
    if !routing.has_order() {
        debug!("No ordering configured, keeping current");
        return Ok(());
    }
    if routing.primary.is_none() {
        debug!("No primary configured, replacing fallbacks only");
        set_fallbacks(routing.fallbacks.clone());
        return Ok(());
    }
    set_ordering(routing.to_order()).inspect_err(|e| warn!("Routing not applied: {e}"))
}

/// Spawn a task that applies routing to the clients on every config change
pub fn spawn_routing_sync(
    config: ReloadableConfig,
    stt: Arc<SttClient>,
    tts: Arc<TtsClient>,
) -> JoinHandle<()> {
    let mut changes = config.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let version = *changes.borrow_and_update();
            match config.apply_routing(&stt, &tts) {
                Ok(()) => info!(version, "Provider routing updated"),
                Err(e) => warn!(version, "Provider routing partially applied: {e}"),
            }
        }
        debug!("Configuration notifier dropped, routing sync stopped");
    })
}

/// Spawn a background task that listens for SIGHUP and reloads configuration
#[cfg(unix)]
pub fn spawn_config_reload_handler(config: ReloadableConfig) -> ReloadableConfig {
    use tokio::signal::unix::{SignalKind, signal};

    let config_clone = config.clone();
    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGHUP handler: {e}");
                return;
            }
        };

        while sighup.recv().await.is_some() {
            info!("Received SIGHUP, reloading configuration");
            if !config_clone.reload() {
                warn!("Configuration reload failed, keeping previous config");
            }
        }
    });

    config
}

/// No-op on non-Unix systems
#[cfg(not(unix))]
pub fn spawn_config_reload_handler(config: ReloadableConfig) -> ReloadableConfig {
    warn!("SIGHUP config reload not supported on this platform");
    config
}

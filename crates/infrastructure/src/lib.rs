//! Infrastructure for VoiceBridge
//!
//! Configuration loading with the `config` crate, hot reload of provider
//! routing and `tracing` subscriber setup.

pub mod config;
pub mod reload;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use reload::{ReloadableConfig, spawn_config_reload_handler, spawn_routing_sync};
pub use telemetry::{TelemetryConfig, TelemetryError, TelemetryGuard, init_telemetry};

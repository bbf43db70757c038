//! Call system ports
//!
//! # Call lifecycle
//!
//! ```text
//!            ┌──────────▶ answered ──────┬──▶ ended
//!            │                           └──▶ failed
//! ringing ───┼──▶ ended / failed
//!            └──▶ busy / no_answer
//! ```
//!
//! Terminal statuses never change again. [`CallLifecycle`] enforces these
//! rules for adapters and records when the call was answered and ended.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{AgentConfig, AgentSession};
use crate::error::TelephonyError;
use crate::transport::Connection;

/// Inbound or outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Incoming call
    Inbound,
    /// Outgoing call
    Outbound,
}

/// Call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Ringing, not yet answered
    Ringing,
    /// Connected
    Answered,
    /// Ended normally
    Ended,
    /// Failed
    Failed,
    /// Line was busy
    Busy,
    /// Nobody answered
    NoAnswer,
}

impl CallStatus {
    /// Whether the call is over
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ringing | Self::Answered)
    }

    /// Whether the lifecycle allows moving to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Ringing => !matches!(next, Self::Ringing),
            Self::Answered => matches!(next, Self::Ended | Self::Failed),
            Self::Ended | Self::Failed | Self::Busy | Self::NoAnswer => false,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ringing => "ringing",
            Self::Answered => "answered",
            Self::Ended => "ended",
            Self::Failed => "failed",
            Self::Busy => "busy",
            Self::NoAnswer => "no_answer",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy)]
struct LifecycleState {
    status: CallStatus,
    started_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

/// Status tracker enforcing the call lifecycle
#[derive(Debug)]
pub struct CallLifecycle {
    state: Mutex<LifecycleState>,
}

impl CallLifecycle {
    /// A ringing call started now
    #[must_use]
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// A ringing call started at `at`
    #[must_use]
    pub fn started_at(at: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(LifecycleState {
                status: CallStatus::Ringing,
                started_at: at,
                answered_at: None,
                ended_at: None,
            }),
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> CallStatus {
        self.state.lock().status
    }

    /// When the call started ringing
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.state.lock().started_at
    }

    /// Move to `next` now
    pub fn transition(&self, next: CallStatus) -> Result<CallStatus, TelephonyError> {
        self.transition_at(next, Utc::now())
    }

    /// Move to `next`, as reported at `at`
    ///
    /// Returns the previous status. Repeating the current status is a
    /// no-op, since platforms may deliver the same status update twice.
    pub fn transition_at(
        &self,
        next: CallStatus,
        at: DateTime<Utc>,
    ) -> Result<CallStatus, TelephonyError> {
        let mut state = self.state.lock();
        let previous = state.status;

        if previous == next {
            debug!(status = %next, "Repeated call status ignored");
            return Ok(previous);
        }
        if !previous.can_transition_to(next) {
            return Err(TelephonyError::InvalidTransition {
                from: previous,
                to: next,
            });
        }

        state.status = next;
        if next == CallStatus::Answered {
            state.answered_at = Some(at);
        }
        if next.is_terminal() {
            state.ended_at = Some(at);
        }
        info!(from = %previous, to = %next, "Call status changed");
        Ok(previous)
    }

    /// Talk time: from answer until end, or until `now` while connected
    ///
    /// Zero for calls that were never answered.
    #[must_use]
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        let state = self.state.lock();
        state.answered_at.map_or(Duration::ZERO, |answered| {
            let end = state.ended_at.unwrap_or(now);
            (end - answered).to_std().unwrap_or_default()
        })
    }

    /// Talk time up to now
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration_at(Utc::now())
    }
}

impl Default for CallLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for an outbound call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOptions {
    /// Caller ID; the system's default number when unset
    pub from: Option<String>,
    /// How long to ring before giving up
    pub timeout: Option<Duration>,
    /// Detect answering machines
    pub machine_detection: bool,
    /// Record the call
    pub record: bool,
    /// Message played to the agent before connecting
    pub whisper: Option<String>,
    /// Agent attached once the call is answered
    pub agent: Option<AgentConfig>,
    /// Webhook receiving status updates
    pub status_callback: Option<String>,
}

impl CallOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the caller ID
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the ring timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable answering machine detection
    #[must_use]
    pub const fn with_machine_detection(mut self) -> Self {
        self.machine_detection = true;
        self
    }

    /// Enable recording
    #[must_use]
    pub const fn with_recording(mut self) -> Self {
        self.record = true;
        self
    }

    /// Set a whisper message
    #[must_use]
    pub fn with_whisper(mut self, message: impl Into<String>) -> Self {
        self.whisper = Some(message.into());
        self
    }

    /// Attach an agent once answered
    #[must_use]
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Set the status webhook
    #[must_use]
    pub fn with_status_callback(mut self, url: impl Into<String>) -> Self {
        self.status_callback = Some(url.into());
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.from.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err("from must not be empty".to_string());
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err("timeout must be greater than zero".to_string());
        }
        if let Some(url) = self
            .status_callback
            .as_deref()
            .filter(|url| !url.starts_with("http://") && !url.starts_with("https://"))
        {
            return Err(format!("status_callback must be an http(s) URL: {url}"));
        }
        if let Some(agent) = &self.agent {
            agent.validate()?;
        }
        Ok(())
    }
}

/// Credentials and defaults for a call system
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSystemConfig {
    /// Account identifier
    pub account_sid: String,
    /// Authentication token
    pub auth_token: Option<String>,
    /// API key, alternative to the token
    pub api_key: Option<String>,
    /// Secret belonging to `api_key`
    pub api_secret: Option<String>,
    /// URL receiving incoming-call webhooks
    pub webhook_url: Option<String>,
    /// Default outbound caller ID
    pub phone_number: Option<String>,
    /// Service region
    pub region: Option<String>,
}

impl fmt::Debug for CallSystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSystemConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("webhook_url", &self.webhook_url)
            .field("phone_number", &self.phone_number)
            .field("region", &self.region)
            .finish()
    }
}

impl CallSystemConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.account_sid.trim().is_empty() {
            return Err("account_sid must not be empty".to_string());
        }
        let has_key_pair = self.api_key.is_some() && self.api_secret.is_some();
        if self.auth_token.is_none() && !has_key_pair {
            return Err("either auth_token or api_key with api_secret is required".to_string());
        }
        Ok(())
    }
}

/// A phone or video call
#[async_trait]
pub trait Call: Send + Sync {
    /// Call identifier
    fn id(&self) -> &str;

    /// Inbound or outbound
    fn direction(&self) -> CallDirection;

    /// Current status
    fn status(&self) -> CallStatus;

    /// Caller ID
    fn caller(&self) -> &str;

    /// Called number
    fn callee(&self) -> &str;

    /// When the call started
    fn start_time(&self) -> DateTime<Utc>;

    /// Talk time so far
    fn duration(&self) -> Duration;

    /// Answer an inbound call
    async fn answer(&self) -> Result<(), TelephonyError>;

    /// End the call
    async fn hangup(&self) -> Result<(), TelephonyError>;

    /// Underlying transport connection, once media is flowing
    fn connection(&self) -> Option<Arc<dyn Connection>>;

    /// Attach a voice agent to handle the call
    async fn attach_agent(&self, session: Arc<dyn AgentSession>) -> Result<(), TelephonyError>;

    /// Detach the voice agent
    async fn detach_agent(&self) -> Result<(), TelephonyError>;
}

/// Receives calls as they arrive
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Handle a new inbound call
    async fn on_call(&self, call: Arc<dyn Call>) -> Result<(), TelephonyError>;
}

/// A telephony platform integration
#[async_trait]
pub trait CallSystem: Send + Sync {
    /// Call system name
    fn name(&self) -> &str;

    /// Apply credentials and defaults
    async fn configure(&self, config: &CallSystemConfig) -> Result<(), TelephonyError>;

    /// Register the handler for incoming calls, replacing any previous one
    fn on_incoming_call(&self, handler: Arc<dyn CallHandler>);

    /// Place an outbound call
    async fn make_call(
        &self,
        to: &str,
        options: CallOptions,
    ) -> Result<Arc<dyn Call>, TelephonyError>;

    /// Look up a call
    async fn get_call(&self, call_id: &str) -> Result<Arc<dyn Call>, TelephonyError>;

    /// Calls that have not ended
    async fn list_calls(&self) -> Result<Vec<Arc<dyn Call>>, TelephonyError>;

    /// Shut the integration down
    async fn close(&self) -> Result<(), TelephonyError>;
}

//! Agent session hook
//!
//! Calls and meetings hand their transport connection to an
//! [`AgentSession`], which drives speech orchestration for the lifetime of
//! the connection. [`AgentSlot`] holds at most one attached session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::TelephonyError;
use crate::transport::Connection;

/// Agent settings carried by call and meeting options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Human-readable agent name
    pub name: String,
    /// TTS voice to speak with
    pub voice_id: Option<String>,
    /// Primary language (BCP-47)
    pub language: Option<String>,
    /// Preferred STT provider
    pub stt_provider: Option<String>,
    /// Preferred TTS provider
    pub tts_provider: Option<String>,
    /// Upper bound on the session length
    #[serde(with = "optional_secs")]
    pub max_session: Option<Duration>,
}

impl AgentConfig {
    /// Agent with a name and default settings
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the TTS voice
    #[must_use]
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Set the language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("agent name must not be empty".to_string());
        }
        if self.max_session.is_some_and(|d| d.is_zero()) {
            return Err("agent max_session must be greater than zero".to_string());
        }
        Ok(())
    }
}

mod optional_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // serde's `with` passes a reference
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

/// A voice agent bound to one connection
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AgentSession: Send + Sync {
    /// Session identifier
    fn id(&self) -> &str;

    /// Start serving `connection`
    async fn start(&self, connection: Arc<dyn Connection>) -> Result<(), TelephonyError>;

    /// Stop gracefully
    async fn stop(&self) -> Result<(), TelephonyError>;
}

/// Holder for the agent attached to a call or meeting
#[derive(Default)]
pub struct AgentSlot {
    current: Mutex<Option<Arc<dyn AgentSession>>>,
}

impl std::fmt::Debug for AgentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSlot").finish_non_exhaustive()
    }
}

impl AgentSlot {
    /// Empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `session` on `connection` and keep it attached
    ///
    /// Fails with [`TelephonyError::AgentAlreadyAttached`] while another
    /// session is attached. A session that fails to start is not kept.
    pub async fn attach(
        &self,
        session: Arc<dyn AgentSession>,
        connection: Arc<dyn Connection>,
    ) -> Result<(), TelephonyError> {
        let mut current = self.current.lock().await;
        if let Some(existing) = current.as_ref() {
            return Err(TelephonyError::AgentAlreadyAttached(existing.id().to_string()));
        }

        debug!(agent = session.id(), connection = connection.id(), "Starting agent session");
        session.start(connection).await?;
        info!(agent = session.id(), "Agent session attached");
        *current = Some(session);
        Ok(())
    }

    /// Stop and release the attached session
    ///
    /// The slot is empty afterwards even if stopping fails.
    pub async fn detach(&self) -> Result<(), TelephonyError> {
        let session = self
            .current
            .lock()
            .await
            .take()
            .ok_or(TelephonyError::NoAgentAttached)?;

        match session.stop().await {
            Ok(()) => {
                info!(agent = session.id(), "Agent session detached");
                Ok(())
            }
            Err(e) => {
                warn!(agent = session.id(), "Agent session failed to stop: {e}");
                Err(e)
            }
        }
    }

    /// Identifier of the attached session
    pub async fn attached(&self) -> Option<String> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|session| session.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockConnection;

    fn connection() -> Arc<dyn Connection> {
        let mut conn = MockConnection::new();
        conn.expect_id().return_const("conn-1".to_string());
        Arc::new(conn)
    }

    fn session(id: &str) -> MockAgentSession {
        let mut session = MockAgentSession::new();
        session.expect_id().return_const(id.to_string());
        session
    }

    #[tokio::test]
    async fn attach_starts_the_session() {
        let mut agent = session("agent-1");
        agent.expect_start().times(1).returning(|_| Ok(()));
        let slot = AgentSlot::new();

        slot.attach(Arc::new(agent), connection()).await.unwrap();

        assert_eq!(slot.attached().await.as_deref(), Some("agent-1"));
    }

    #[tokio::test]
    async fn second_attach_is_rejected() {
        let mut first = session("first");
        first.expect_start().returning(|_| Ok(()));
        let mut second = session("second");
        second.expect_start().never();
        let slot = AgentSlot::new();

        slot.attach(Arc::new(first), connection()).await.unwrap();
        let err = slot.attach(Arc::new(second), connection()).await.unwrap_err();

        assert!(matches!(err, TelephonyError::AgentAlreadyAttached(id) if id == "first"));
    }

    #[tokio::test]
    async fn failed_start_leaves_slot_empty() {
        let mut agent = session("agent-1");
        agent
            .expect_start()
            .returning(|_| Err(TelephonyError::AgentFailed("no STT provider".into())));
        let slot = AgentSlot::new();

        assert!(slot.attach(Arc::new(agent), connection()).await.is_err());
        assert!(slot.attached().await.is_none());
    }

    #[tokio::test]
    async fn detach_stops_and_clears() {
        let mut agent = session("agent-1");
        agent.expect_start().returning(|_| Ok(()));
        agent.expect_stop().times(1).returning(|| Ok(()));
        let slot = AgentSlot::new();
        slot.attach(Arc::new(agent), connection()).await.unwrap();

        slot.detach().await.unwrap();

        assert!(slot.attached().await.is_none());
        assert!(matches!(
            slot.detach().await,
            Err(TelephonyError::NoAgentAttached)
        ));
    }

    #[test]
    fn config_validation() {
        assert!(AgentConfig::new("receptionist").validate().is_ok());
        assert!(AgentConfig::default().validate().is_err());

        let zero = AgentConfig {
            max_session: Some(Duration::ZERO),
            ..AgentConfig::new("x")
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn config_reads_session_limit_in_seconds() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"name": "support", "voice_id": "nova", "max_session": 600}"#,
        )
        .unwrap();

        assert_eq!(config.max_session, Some(Duration::from_secs(600)));
        assert_eq!(config.voice_id.as_deref(), Some("nova"));
    }
}

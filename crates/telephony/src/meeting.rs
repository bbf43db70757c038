//! Meeting platform ports

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, AgentSession};
use crate::error::TelephonyError;
use crate::transport::Connection;

/// A meeting participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether audio is muted
    #[serde(default)]
    pub is_muted: bool,
    /// Whether this is a bot
    #[serde(default)]
    pub is_bot: bool,
}

impl Participant {
    /// Unmuted human participant
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_muted: false,
            is_bot: false,
        }
    }
}

/// Options for joining a meeting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingOptions {
    /// Name shown for the bot
    pub display_name: Option<String>,
    /// Join with audio muted
    pub muted: bool,
    /// Agent attached after joining
    pub agent: Option<AgentConfig>,
}

impl MeetingOptions {
    /// Set the bot's display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Join muted
    #[must_use]
    pub const fn with_muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// Attach an agent after joining
    #[must_use]
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = Some(agent);
        self
    }
}

/// A joined audio or video meeting
#[async_trait]
pub trait Meeting: Send + Sync {
    /// Meeting identifier
    fn id(&self) -> &str;

    /// Meeting title
    fn title(&self) -> &str;

    /// Current participants
    fn participants(&self) -> Vec<Participant>;

    /// Transport connection carrying the meeting audio
    fn connection(&self) -> Arc<dyn Connection>;

    /// Attach a voice agent to the meeting
    async fn attach_agent(&self, session: Arc<dyn AgentSession>) -> Result<(), TelephonyError>;

    /// Detach the voice agent
    async fn detach_agent(&self) -> Result<(), TelephonyError>;

    /// Leave the meeting
    async fn leave(&self) -> Result<(), TelephonyError>;
}

/// A meeting platform integration
#[async_trait]
pub trait MeetingSystem: Send + Sync {
    /// Meeting system name
    fn name(&self) -> &str;

    /// Join an existing meeting
    async fn join_meeting(
        &self,
        meeting_id: &str,
        options: MeetingOptions,
    ) -> Result<Arc<dyn Meeting>, TelephonyError>;

    /// Leave a meeting by identifier
    async fn leave_meeting(&self, meeting_id: &str) -> Result<(), TelephonyError>;

    /// Meetings currently joined
    async fn list_meetings(&self) -> Result<Vec<Arc<dyn Meeting>>, TelephonyError>;
}

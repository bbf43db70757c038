//! Telephony - transport, call and meeting ports
//!
//! Contracts for the layer that carries audio between remote parties and a
//! voice agent:
//! - `Transport` / `Connection` - bidirectional audio plus side-channel events
//! - `CallSystem` / `Call` - phone call lifecycle (ring, answer, hang up)
//! - `MeetingSystem` / `Meeting` - joining audio and video meetings
//! - `AgentSession` - the hook binding a connection to speech orchestration
//!
//! Platform adapters (Twilio, SIP trunks, meeting bots) live outside this
//! workspace. [`CallLifecycle`] and [`AgentSlot`] are the shared pieces
//! adapters build on.

pub mod agent;
pub mod call;
pub mod error;
pub mod meeting;
pub mod transport;

pub use agent::{AgentConfig, AgentSession, AgentSlot};
pub use call::{
    Call, CallDirection, CallHandler, CallLifecycle, CallOptions, CallStatus, CallSystem,
    CallSystemConfig,
};
pub use error::TelephonyError;
pub use meeting::{Meeting, MeetingOptions, MeetingSystem, Participant};
pub use transport::{
    AudioByteStream, Connection, ConnectionStream, TelephonyTransport, Transport,
    TransportConfig, TransportEncoding, TransportEvent, TransportEventStream, validate_dtmf,
};

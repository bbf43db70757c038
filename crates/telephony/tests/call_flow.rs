//! Integration tests for the call and meeting ports
//!
//! An in-memory call system built on `CallLifecycle` and `AgentSlot` walks
//! calls through their lifecycle with a mocked agent session.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use mockall::mock;
use parking_lot::Mutex;
use telephony::{
    AgentConfig, AgentSession, AgentSlot, AudioByteStream, Call, CallDirection, CallHandler,
    CallLifecycle, CallOptions, CallStatus, CallSystem, CallSystemConfig, Connection,
    TelephonyError, TransportEvent, TransportEventStream,
};

// ============ Fakes ============

struct LoopbackConnection {
    id: String,
    sent: Mutex<Vec<Bytes>>,
    audio_out: Mutex<Option<AudioByteStream>>,
    events: Mutex<Option<TransportEventStream>>,
    closed: AtomicBool,
}

impl LoopbackConnection {
    fn new(id: &str, inbound_audio: Vec<Bytes>) -> Self {
        let events = vec![TransportEvent::Connected, TransportEvent::Dtmf('1')];
        Self {
            id: id.to_string(),
            sent: Mutex::new(Vec::new()),
            audio_out: Mutex::new(Some(Box::pin(futures::stream::iter(inbound_audio)))),
            events: Mutex::new(Some(Box::pin(futures::stream::iter(events)))),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Connection for LoopbackConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }

    async fn send_audio(&self, audio: Bytes) -> Result<(), TelephonyError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TelephonyError::Closed);
        }
        self.sent.lock().push(audio);
        Ok(())
    }

    fn take_audio_out(&self) -> Option<AudioByteStream> {
        self.audio_out.lock().take()
    }

    fn take_events(&self) -> Option<TransportEventStream> {
        self.events.lock().take()
    }

    async fn close(&self) -> Result<(), TelephonyError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeCall {
    id: String,
    direction: CallDirection,
    caller: String,
    callee: String,
    lifecycle: CallLifecycle,
    connection: Arc<LoopbackConnection>,
    agent: AgentSlot,
}

impl FakeCall {
    fn new(id: String, direction: CallDirection, caller: &str, callee: &str) -> Self {
        let connection = Arc::new(LoopbackConnection::new(
            &format!("{id}-media"),
            vec![Bytes::from_static(b"hello")],
        ));
        Self {
            id,
            direction,
            caller: caller.to_string(),
            callee: callee.to_string(),
            lifecycle: CallLifecycle::new(),
            connection,
            agent: AgentSlot::new(),
        }
    }
}

#[async_trait]
impl Call for FakeCall {
    fn id(&self) -> &str {
        &self.id
    }

    fn direction(&self) -> CallDirection {
        self.direction
    }

    fn status(&self) -> CallStatus {
        self.lifecycle.status()
    }

    fn caller(&self) -> &str {
        &self.caller
    }

    fn callee(&self) -> &str {
        &self.callee
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.lifecycle.start_time()
    }

    fn duration(&self) -> Duration {
        self.lifecycle.duration()
    }

    async fn answer(&self) -> Result<(), TelephonyError> {
        self.lifecycle.transition(CallStatus::Answered).map(|_| ())
    }

    async fn hangup(&self) -> Result<(), TelephonyError> {
        match self.agent.detach().await {
            Ok(()) | Err(TelephonyError::NoAgentAttached) => {}
            Err(e) => return Err(e),
        }
        self.lifecycle.transition(CallStatus::Ended)?;
        self.connection.close().await
    }

    fn connection(&self) -> Option<Arc<dyn Connection>> {
        (self.status() == CallStatus::Answered)
            .then(|| Arc::clone(&self.connection) as Arc<dyn Connection>)
    }

    async fn attach_agent(&self, session: Arc<dyn AgentSession>) -> Result<(), TelephonyError> {
        let connection = self.connection().ok_or(TelephonyError::Closed)?;
        self.agent.attach(session, connection).await
    }

    async fn detach_agent(&self) -> Result<(), TelephonyError> {
        self.agent.detach().await
    }
}

#[derive(Default)]
struct FakeCallSystem {
    configured: AtomicBool,
    next_id: AtomicUsize,
    calls: Mutex<HashMap<String, Arc<FakeCall>>>,
    handler: Mutex<Option<Arc<dyn CallHandler>>>,
}

impl FakeCallSystem {
    fn new_call(&self, direction: CallDirection, caller: &str, callee: &str) -> Arc<FakeCall> {
        let id = format!("CA{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let call = Arc::new(FakeCall::new(id.clone(), direction, caller, callee));
        self.calls.lock().insert(id, Arc::clone(&call));
        call
    }

    async fn ring(&self, caller: &str) -> Result<Arc<FakeCall>, TelephonyError> {
        let call = self.new_call(CallDirection::Inbound, caller, "+15550000");
        let handler = self
            .handler
            .lock()
            .clone()
            .ok_or_else(|| TelephonyError::NotSupported("no incoming call handler".into()))?;
        handler.on_call(Arc::clone(&call) as Arc<dyn Call>).await?;
        Ok(call)
    }
}

#[async_trait]
impl CallSystem for FakeCallSystem {
    fn name(&self) -> &str {
        "fake"
    }

    async fn configure(&self, config: &CallSystemConfig) -> Result<(), TelephonyError> {
        config.validate().map_err(TelephonyError::InvalidConfig)?;
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn on_incoming_call(&self, handler: Arc<dyn CallHandler>) {
        *self.handler.lock() = Some(handler);
    }

    async fn make_call(
        &self,
        to: &str,
        options: CallOptions,
    ) -> Result<Arc<dyn Call>, TelephonyError> {
        if !self.configured.load(Ordering::SeqCst) {
            return Err(TelephonyError::InvalidConfig("not configured".into()));
        }
        options.validate().map_err(TelephonyError::InvalidConfig)?;
        let from = options.from.as_deref().unwrap_or("+15550000");
        Ok(self.new_call(CallDirection::Outbound, from, to))
    }

    async fn get_call(&self, call_id: &str) -> Result<Arc<dyn Call>, TelephonyError> {
        self.calls
            .lock()
            .get(call_id)
            .map(|call| Arc::clone(call) as Arc<dyn Call>)
            .ok_or_else(|| TelephonyError::CallNotFound(call_id.to_string()))
    }

    async fn list_calls(&self) -> Result<Vec<Arc<dyn Call>>, TelephonyError> {
        let mut calls: Vec<Arc<dyn Call>> = self
            .calls
            .lock()
            .values()
            .filter(|call| !call.status().is_terminal())
            .map(|call| Arc::clone(call) as Arc<dyn Call>)
            .collect();
        calls.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(calls)
    }

    async fn close(&self) -> Result<(), TelephonyError> {
        self.calls.lock().clear();
        Ok(())
    }
}

mock! {
    pub Agent {}

    #[async_trait]
    impl AgentSession for Agent {
        fn id(&self) -> &str;
        async fn start(&self, connection: Arc<dyn Connection>) -> Result<(), TelephonyError>;
        async fn stop(&self) -> Result<(), TelephonyError>;
    }
}

fn agent(id: &str) -> MockAgent {
    let mut agent = MockAgent::new();
    agent.expect_id().return_const(id.to_string());
    agent
}

async fn configured_system() -> FakeCallSystem {
    let system = FakeCallSystem::default();
    system
        .configure(&CallSystemConfig {
            account_sid: "AC1".into(),
            auth_token: Some("token".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    system
}

// ============ Outbound calls ============

#[tokio::test]
async fn outbound_call_lifecycle_with_agent() {
    let system = configured_system().await;
    let call = system
        .make_call(
            "+15550123",
            CallOptions::new().with_from("+15550999").with_agent(AgentConfig::new("sales")),
        )
        .await
        .unwrap();

    assert_eq!(call.direction(), CallDirection::Outbound);
    assert_eq!(call.status(), CallStatus::Ringing);
    assert_eq!(call.caller(), "+15550999");
    assert!(call.connection().is_none());

    call.answer().await.unwrap();

    let mut session = agent("agent-1");
    session
        .expect_start()
        .withf(|conn| conn.id().ends_with("-media"))
        .times(1)
        .returning(|_| Ok(()));
    session.expect_stop().times(1).returning(|| Ok(()));
    call.attach_agent(Arc::new(session)).await.unwrap();

    call.hangup().await.unwrap();

    assert_eq!(call.status(), CallStatus::Ended);
    assert!(system.list_calls().await.unwrap().is_empty());
}

#[tokio::test]
async fn unconfigured_system_rejects_calls() {
    let system = FakeCallSystem::default();

    let err = system
        .make_call("+15550123", CallOptions::new())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, TelephonyError::InvalidConfig(_)));
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let system = configured_system().await;

    let result = system
        .make_call(
            "+15550123",
            CallOptions::new().with_timeout(Duration::ZERO),
        )
        .await;

    assert!(matches!(result, Err(TelephonyError::InvalidConfig(_))));
}

#[tokio::test]
async fn agent_needs_an_answered_call() {
    let system = configured_system().await;
    let call = system
        .make_call("+15550123", CallOptions::new())
        .await
        .unwrap();

    let mut session = agent("early");
    session.expect_start().never();

    let err = call.attach_agent(Arc::new(session)).await.unwrap_err();
    assert!(matches!(err, TelephonyError::Closed));
}

#[tokio::test]
async fn ended_call_cannot_be_answered() {
    let system = configured_system().await;
    let call = system
        .make_call("+15550123", CallOptions::new())
        .await
        .unwrap();
    call.hangup().await.unwrap();

    let err = call.answer().await.unwrap_err();

    assert!(matches!(
        err,
        TelephonyError::InvalidTransition {
            from: CallStatus::Ended,
            to: CallStatus::Answered
        }
    ));
}

// ============ Inbound calls ============

struct AnsweringHandler {
    answered: Mutex<Vec<String>>,
}

#[async_trait]
impl CallHandler for AnsweringHandler {
    async fn on_call(&self, call: Arc<dyn Call>) -> Result<(), TelephonyError> {
        call.answer().await?;
        self.answered.lock().push(call.id().to_string());
        Ok(())
    }
}

#[tokio::test]
async fn inbound_call_reaches_handler() {
    let system = configured_system().await;
    let handler = Arc::new(AnsweringHandler {
        answered: Mutex::new(Vec::new()),
    });
    system.on_incoming_call(Arc::clone(&handler) as Arc<dyn CallHandler>);

    let call = system.ring("+15550111").await.unwrap();

    assert_eq!(call.direction(), CallDirection::Inbound);
    assert_eq!(call.status(), CallStatus::Answered);
    assert_eq!(*handler.answered.lock(), vec![call.id().to_string()]);

    let listed = system.list_calls().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        system.get_call(call.id()).await.unwrap().caller(),
        "+15550111"
    );
}

#[tokio::test]
async fn unknown_call_is_not_found() {
    let system = configured_system().await;

    let err = system.get_call("CA404").await.err().unwrap();

    assert!(matches!(err, TelephonyError::CallNotFound(ref id) if id == "CA404"));
    assert!(err.is_terminal());
}

// ============ Media ============

#[tokio::test]
async fn connection_streams_are_taken_once() {
    let system = configured_system().await;
    let call = system
        .make_call("+15550123", CallOptions::new())
        .await
        .unwrap();
    call.answer().await.unwrap();
    let conn = call.connection().unwrap();

    let audio: Vec<Bytes> = conn.take_audio_out().unwrap().collect().await;
    assert_eq!(audio, vec![Bytes::from_static(b"hello")]);
    assert!(conn.take_audio_out().is_none());

    let events: Vec<TransportEvent> = conn.take_events().unwrap().collect().await;
    assert_eq!(events, vec![TransportEvent::Connected, TransportEvent::Dtmf('1')]);
    assert!(conn.take_events().is_none());

    conn.send_audio(Bytes::from_static(b"hi")).await.unwrap();
    call.hangup().await.unwrap();
    assert!(matches!(
        conn.send_audio(Bytes::from_static(b"late")).await,
        Err(TelephonyError::Closed)
    ));
}

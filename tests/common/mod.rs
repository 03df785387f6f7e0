//! Shared test fixtures.
//!
//! - [`ScriptedTransport`]: in-memory transport whose events the test fires
//! - [`Recorder`]: captures every lifecycle hook of a session
//! - [`TestServer`]: loopback WebSocket server speaking the service protocol

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use notify_client::{
    EventSink, HookEvent, HookKind, OpCode, Result, ServiceFrame, Session, Transport,
    TransportEvent, encode_batch,
};

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`; repeated calls are fine.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Lets spawned tasks run without advancing the clock.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// ScriptedTransport
// ============================================================================

/// Everything the session did to the transport.
#[derive(Default)]
pub struct Script {
    pub connects: usize,
    pub closes: usize,
    pub auths: Vec<String>,
    pub sent: Vec<Vec<u8>>,
    pub fail_sends: bool,
    sinks: Vec<EventSink>,
}

/// Transport driven by the test: calls are recorded, events are fired by hand.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` on the sink of the latest `connect`.
    pub fn fire(&self, event: TransportEvent) {
        let sink = self
            .script
            .lock()
            .sinks
            .last()
            .cloned()
            .expect("transport was never connected");
        assert!(sink.send(event), "session driver is gone");
    }

    /// Delivers `event` on the sink of the `attempt`-th `connect`, counting
    /// from zero, as a channel that was already replaced would.
    pub fn fire_on(&self, attempt: usize, event: TransportEvent) {
        let sink = self
            .script
            .lock()
            .sinks
            .get(attempt)
            .cloned()
            .expect("no such connect attempt");
        assert!(sink.send(event), "session driver is gone");
    }

    pub fn connects(&self) -> usize {
        self.script.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.script.lock().closes
    }

    pub fn auths(&self) -> Vec<String> {
        self.script.lock().auths.clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.script.lock().sent.clone()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.script.lock().fail_sends = fail;
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, events: EventSink) {
        let mut script = self.script.lock();
        script.connects += 1;
        script.sinks.push(events);
    }

    fn close(&mut self) {
        self.script.lock().closes += 1;
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let mut script = self.script.lock();
        if script.fail_sends {
            return Err(notify_client::Error::ConnectionClosed);
        }
        script.sent.push(payload.to_vec());
        Ok(())
    }

    fn authenticate(&mut self, credential: &str) -> Result<()> {
        self.script.lock().auths.push(credential.to_string());
        Ok(())
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Owned copy of a hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Open,
    Message(Vec<u8>),
    Close,
    Error {
        message: String,
        fatal: bool,
        decode: bool,
    },
}

impl Recorded {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Receives every hook invocation of one session, in order.
pub struct Recorder {
    rx: mpsc::UnboundedReceiver<Recorded>,
}

impl Recorder {
    /// Hooks all four lifecycle kinds of `session`.
    pub fn attach(session: &Session) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        for kind in [
            HookKind::Open,
            HookKind::Message,
            HookKind::Close,
            HookKind::Error,
        ] {
            let tx = tx.clone();
            session.hook(kind, move |event| {
                let recorded = match event {
                    HookEvent::Open => Recorded::Open,
                    HookEvent::Message(bytes) => Recorded::Message(bytes.to_vec()),
                    HookEvent::Close => Recorded::Close,
                    HookEvent::Error(e) => Recorded::Error {
                        message: e.to_string(),
                        fatal: e.is_fatal(),
                        decode: e.is_decode_error(),
                    },
                };
                let _ = tx.send(recorded);
            });
        }

        Self { rx }
    }

    /// Everything recorded so far.
    pub fn drain(&mut self) -> Vec<Recorded> {
        let mut out = Vec::new();
        while let Ok(recorded) = self.rx.try_recv() {
            out.push(recorded);
        }
        out
    }

    /// Waits for the next invocation.
    pub async fn next(&mut self) -> Recorded {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a hook")
            .expect("recorder channel closed")
    }

    /// Waits until an invocation equal to `expected` arrives, skipping others.
    pub async fn wait_for(&mut self, expected: &Recorded) {
        loop {
            if &self.next().await == expected {
                return;
            }
        }
    }

    /// Waits for the next error invocation, skipping others.
    pub async fn next_error(&mut self) -> Recorded {
        loop {
            let recorded = self.next().await;
            if recorded.is_error() {
                return recorded;
            }
        }
    }
}

// ============================================================================
// TestServer
// ============================================================================

/// How the loopback server behaves.
#[derive(Debug, Clone)]
pub struct ServerBehavior {
    /// Credential answered with `AuthAck "ok"`; anything else gets `"denied"`.
    pub token: String,
    /// Answer client pings with pongs.
    pub answer_pings: bool,
    /// Echo every application payload back as a one-entry batch.
    pub echo: bool,
    /// Close this many connections right after a successful auth.
    pub drop_after_auth: usize,
}

impl Default for ServerBehavior {
    fn default() -> Self {
        Self {
            token: "secret".to_string(),
            answer_pings: true,
            echo: true,
            drop_after_auth: 0,
        }
    }
}

/// Counters observed by the server.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub accepts: AtomicUsize,
    pub pings: AtomicUsize,
    pub auths: AtomicUsize,
}

/// Loopback WebSocket server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub stats: Arc<ServerStats>,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start(behavior: ServerBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let stats = Arc::new(ServerStats::default());
        let drops_left = Arc::new(AtomicUsize::new(behavior.drop_after_auth));

        let task = tokio::spawn({
            let stats = Arc::clone(&stats);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    stats.accepts.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        stream,
                        behavior.clone(),
                        Arc::clone(&stats),
                        Arc::clone(&drops_left),
                    ));
                }
            }
        });

        Self { addr, stats, task }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn accepts(&self) -> usize {
        self.stats.accepts.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.stats.pings.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    stream: TcpStream,
    behavior: ServerBehavior,
    stats: Arc<ServerStats>,
    drops_left: Arc<AtomicUsize>,
) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    while let Some(Ok(message)) = read.next().await {
        let bytes = match message {
            Message::Binary(bytes) => bytes.to_vec(),
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(frame) = ServiceFrame::decode(&bytes) else {
            continue;
        };

        let reply = match frame.opcode {
            OpCode::AuthReq => {
                stats.auths.fetch_add(1, Ordering::SeqCst);
                let accepted = frame.payload == behavior.token.as_bytes();
                let ack: &[u8] = if accepted { b"ok" } else { b"denied" };
                let _ = write
                    .send(Message::Binary(ServiceFrame::encode(OpCode::AuthAck, ack).into()))
                    .await;

                let should_drop = accepted
                    && drops_left
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                if should_drop {
                    let _ = write.close().await;
                    break;
                }
                continue;
            }

            OpCode::Ping => {
                stats.pings.fetch_add(1, Ordering::SeqCst);
                if !behavior.answer_pings {
                    continue;
                }
                ServiceFrame::encode(OpCode::Pong, frame.payload)
            }

            OpCode::Message if behavior.echo => {
                let batch = encode_batch([frame.payload]).expect("echo fits a batch");
                ServiceFrame::encode(OpCode::Message, &batch)
            }

            _ => continue,
        };

        if write.send(Message::Binary(reply.into())).await.is_err() {
            break;
        }
    }
}

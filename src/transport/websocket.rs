//! WebSocket transport with the opcode service protocol.
//!
//! Each `connect` spawns one channel task that owns the socket. The task
//! multiplexes three sources with `tokio::select!`:
//!
//! - incoming frames from the server (messages, auth acks, pongs)
//! - outgoing frames from the session
//! - the keepalive deadline
//!
//! Keepalive state lives inside the task, so tearing the channel down also
//! tears the probe timers down; nothing can fire against a dead socket.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{OpCode, ServiceFrame};

use super::config::{DEFAULT_PING_INTERVAL, DEFAULT_PING_TIMEOUT, LatencyCallback};
use super::keepalive::{KeepAlive, KeepAliveAction};
use super::{EventSink, Transport, TransportEvent};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;

/// Internal commands for the channel task.
#[derive(Debug)]
enum ChannelCommand {
    /// Write an encoded service frame.
    Frame(Vec<u8>),
    /// Close the socket and report `Close`.
    Close,
    /// Close the socket silently; a newer channel replaced this one.
    Detach,
}

/// How the channel task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Closed,
    Detached,
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Reference transport speaking the service protocol over a WebSocket.
pub struct WebSocketTransport {
    /// Endpoint.
    url: Url,
    /// Delay between keepalive probes.
    ping_interval: Duration,
    /// Time to wait for a probe's answer.
    ping_timeout: Duration,
    /// Optional round-trip observer.
    on_latency: Option<LatencyCallback>,
    /// Command channel of the live channel task.
    channel: Option<mpsc::UnboundedSender<ChannelCommand>>,
}

impl WebSocketTransport {
    /// Creates a transport with default keepalive timings.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            on_latency: None,
            channel: None,
        }
    }

    /// Sets the keepalive timings.
    #[inline]
    #[must_use]
    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.ping_interval = interval;
        self.ping_timeout = timeout;
        self
    }

    /// Sets the round-trip observer.
    #[inline]
    #[must_use]
    pub fn with_latency_callback(mut self, callback: Option<LatencyCallback>) -> Self {
        self.on_latency = callback;
        self
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns `true` while a channel task is attached.
    #[inline]
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.channel.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn send_frame(&self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        let channel = self.channel.as_ref().ok_or(Error::ConnectionClosed)?;
        channel
            .send(ChannelCommand::Frame(ServiceFrame::encode(opcode, payload)))
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, events: EventSink) {
        if let Some(previous) = self.channel.take() {
            let _ = previous.send(ChannelCommand::Detach);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = ChannelTask {
            events,
            keepalive: KeepAlive::new(self.ping_interval, self.ping_timeout),
            on_latency: self.on_latency.clone(),
        };

        debug!(url = %self.url, "Connecting WebSocket");
        tokio::spawn(task.run(self.url.clone(), command_rx));

        self.channel = Some(command_tx);
    }

    fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            let _ = channel.send(ChannelCommand::Close);
        }
    }

    #[inline]
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.send_frame(OpCode::Message, payload)
    }

    #[inline]
    fn authenticate(&mut self, credential: &str) -> Result<()> {
        self.send_frame(OpCode::AuthReq, credential.as_bytes())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            let _ = channel.send(ChannelCommand::Detach);
        }
    }
}

// ============================================================================
// ChannelTask
// ============================================================================

/// State owned by one channel task.
struct ChannelTask {
    events: EventSink,
    keepalive: KeepAlive,
    on_latency: Option<LatencyCallback>,
}

impl ChannelTask {
    /// Connects, then runs the event loop until the socket ends.
    async fn run(mut self, url: Url, mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>) {
        let mut early_frames = Vec::new();

        let connecting = connect_async(url.as_str());
        tokio::pin!(connecting);

        let ws_stream = loop {
            tokio::select! {
                result = &mut connecting => match result {
                    Ok((stream, _response)) => break stream,
                    Err(e) => {
                        warn!(url = %url, error = %e, "WebSocket connect failed");
                        self.emit(TransportEvent::Error(e.into()));
                        self.emit(TransportEvent::Close);
                        return;
                    }
                },

                command = command_rx.recv() => match command {
                    Some(ChannelCommand::Frame(frame)) => early_frames.push(frame),
                    Some(ChannelCommand::Close) | None => {
                        debug!("Channel closed while connecting");
                        self.emit(TransportEvent::Close);
                        return;
                    }
                    Some(ChannelCommand::Detach) => return,
                },
            }
        };

        info!(url = %url, "WebSocket connection established");

        let (mut ws_write, mut ws_read) = ws_stream.split();
        self.keepalive.start(Instant::now());
        self.emit(TransportEvent::Open);

        let mut exit = Exit::Closed;

        for frame in early_frames {
            if let Err(e) = ws_write.send(Message::Binary(frame.into())).await {
                self.emit(TransportEvent::Error(e.into()));
                self.emit(TransportEvent::Close);
                return;
            }
        }

        loop {
            let deadline = self.keepalive.next_deadline();

            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    let reply = match message {
                        Some(Ok(Message::Binary(bytes))) => self.handle_frame(&bytes),
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_bytes()),

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            self.emit(TransportEvent::Error(e.into()));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Control frames are answered by tungstenite
                        Some(Ok(_)) => None,
                    };

                    if let Some(reply) = reply
                        && let Err(e) = ws_write.send(Message::Binary(reply.into())).await
                    {
                        warn!(error = %e, "Failed to send reply frame");
                    }
                }

                // Frames from the session
                command = command_rx.recv() => {
                    match command {
                        Some(ChannelCommand::Frame(frame)) => {
                            trace!(len = frame.len(), "Writing frame");
                            if let Err(e) = ws_write.send(Message::Binary(frame.into())).await {
                                self.emit(TransportEvent::Error(e.into()));
                                break;
                            }
                        }

                        Some(ChannelCommand::Close) | None => {
                            debug!("Close command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        Some(ChannelCommand::Detach) => {
                            debug!("Channel detached");
                            let _ = ws_write.close().await;
                            exit = Exit::Detached;
                            break;
                        }
                    }
                }

                // Keepalive deadline
                () = sleep_or_pending(deadline) => {
                    if !self.drive_keepalive(&mut ws_write).await {
                        break;
                    }
                }
            }
        }

        if exit == Exit::Closed {
            self.emit(TransportEvent::Close);
        }

        debug!(?exit, "Channel task terminated");
    }

    /// Handles one incoming service frame.
    ///
    /// Returns a frame to write back, if the frame asks for one.
    fn handle_frame(&mut self, bytes: &[u8]) -> Option<Vec<u8>> {
        let frame = match ServiceFrame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "Malformed service frame");
                self.emit(TransportEvent::Error(e));
                return None;
            }
        };

        match frame.opcode {
            OpCode::Message => {
                self.emit(TransportEvent::Message(frame.payload.to_vec()));
                None
            }

            OpCode::AuthAck => {
                let result = if frame.is_auth_ok() {
                    Ok(())
                } else {
                    Err(Error::authentication(frame.payload_text()))
                };
                self.emit(TransportEvent::Auth(result));
                None
            }

            OpCode::Pong => {
                let payload = frame.payload_text();
                match self.keepalive.on_pong(&payload, Instant::now()) {
                    Some(latency) => {
                        trace!(probe = %payload, ?latency, "Pong received");
                        if let Some(ref on_latency) = self.on_latency {
                            on_latency(latency);
                        }
                    }
                    None => debug!(probe = %payload, "Pong for unknown probe"),
                }
                None
            }

            OpCode::Ping => Some(ServiceFrame::encode(OpCode::Pong, frame.payload)),

            OpCode::AuthReq => {
                self.emit(TransportEvent::Error(Error::decode(
                    "unexpected auth-req frame from server",
                )));
                None
            }
        }
    }

    /// Performs every due keepalive action.
    ///
    /// Returns `false` if the socket failed while writing a ping.
    async fn drive_keepalive(&mut self, ws_write: &mut WsWrite) -> bool {
        while let Some(action) = self.keepalive.poll(Instant::now()) {
            match action {
                KeepAliveAction::SendPing(id) => {
                    trace!(probe = %id, "Sending ping");
                    let frame = ServiceFrame::encode(OpCode::Ping, id.to_string().as_bytes());
                    if let Err(e) = ws_write.send(Message::Binary(frame.into())).await {
                        self.emit(TransportEvent::Error(e.into()));
                        return false;
                    }
                }

                KeepAliveAction::TimedOut(id) => {
                    let timeout_ms = self.keepalive.timeout().as_millis() as u64;
                    warn!(
                        probe = %id,
                        timeout_ms,
                        pending = self.keepalive.pending_count(),
                        "Keepalive probe timed out"
                    );
                    self.emit(TransportEvent::Error(Error::keepalive_timeout(id, timeout_ms)));
                }
            }
        }

        if !self.keepalive.is_scheduled() {
            debug!("Keepalive stopped until the next pong");
        }
        true
    }

    /// Reports an event; the session may already be gone.
    #[inline]
    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }
}

/// Sleeps until `deadline`, or forever without one.
async fn sleep_or_pending(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================

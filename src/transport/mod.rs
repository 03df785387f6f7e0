//! Transport layer.
//!
//! A transport is the concrete byte channel a session drives. The session
//! only sees the [`Transport`] contract and the [`TransportEvent`] stream;
//! everything channel-specific (service framing, authentication frames,
//! keepalive) lives behind it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   connect/close/send/authenticate   ┌──────────────────┐
//! │     Session     │ ──────────────────────────────────► │    Transport     │
//! │  (driver task)  │ ◄────────────────────────────────── │  (channel task)  │
//! └─────────────────┘        TransportEvent stream        └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Declarative transport configuration |
//! | `keepalive` | Ping/pong probe bookkeeping |
//! | `websocket` | WebSocket reference transport |

// ============================================================================
// Submodules
// ============================================================================

/// Transport configuration.
pub mod config;

/// Keepalive probe tracking.
pub(crate) mod keepalive;

/// WebSocket transport with the service protocol.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::error::{Error, Result};

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{LatencyCallback, TransportConfig, TransportKind};
pub use websocket::WebSocketTransport;

// ============================================================================
// TransportEvent
// ============================================================================

/// Something that happened on the channel.
#[derive(Debug)]
pub enum TransportEvent {
    /// The underlying channel is open.
    Open,

    /// A batch envelope arrived.
    Message(Vec<u8>),

    /// The remote end answered the authentication request.
    Auth(Result<()>),

    /// A non-fatal channel or decode failure.
    Error(Error),

    /// The channel is gone.
    Close,
}

/// Event tagged with the epoch of the `connect` that produced it.
pub(crate) type TaggedEvent = (u64, TransportEvent);

/// Sending half handed to a transport on every `connect`.
///
/// Each sink is bound to the `connect` call that created it. Events from a
/// channel that has since been replaced are discarded by the session.
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub(crate) fn new(epoch: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { epoch, tx }
    }

    /// Reports `event` to the session.
    ///
    /// Returns `false` if the session is gone.
    #[inline]
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.send((self.epoch, event)).is_ok()
    }

    /// Connect generation this sink belongs to.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Capability contract a session needs from a channel.
///
/// All methods are non-blocking. Outcomes of `connect` and `close` are
/// reported asynchronously through the [`EventSink`] given to `connect`;
/// a transport must eventually report `Close` for every channel it
/// reported `Open` for, and for every connection attempt that failed.
pub trait Transport: Send + 'static {
    /// Starts establishing a fresh channel and reports its events to
    /// `events`.
    ///
    /// A channel still held from an earlier `connect` is dropped without
    /// reporting further events.
    fn connect(&mut self, events: EventSink);

    /// Tears the channel down and forgets it.
    ///
    /// A no-op without a channel.
    fn close(&mut self);

    /// Transmits one application payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if there is no usable channel.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Sends the credential over the open channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if there is no usable channel.
    fn authenticate(&mut self, credential: &str) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    #[inline]
    fn connect(&mut self, events: EventSink) {
        (**self).connect(events);
    }

    #[inline]
    fn close(&mut self) {
        (**self).close();
    }

    #[inline]
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }

    #[inline]
    fn authenticate(&mut self, credential: &str) -> Result<()> {
        (**self).authenticate(credential)
    }
}

//! notify-client - duplex messaging client over WebSocket.
//!
//! Maintains one logical, authenticated, auto-reconnecting session over an
//! unreliable byte channel and multiplexes named application events over it.
//!
//! # Architecture
//!
//! ```text
//! Client ─┬─ Emitter ─── named events ⇄ AppMessage frames
//!         └─ Session ─── state machine, outbound queue, Reconnector
//!               └─ Transport ─── WebSocket + opcode service protocol + keepalive
//! ```
//!
//! Key design principles:
//!
//! - Nothing application-level is sent before authentication succeeds;
//!   payloads queue and flush in order on open
//! - Network drops reconnect with backoff; a rejected credential or an
//!   explicit `disconnect()` never does
//! - Errors on the wire are reported through the `error` hook and never
//!   cross `send` / `connect`
//!
//! # Quick Start
//!
//! ```no_run
//! use notify_client::{Client, HookEvent, HookKind, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .websocket("ws://127.0.0.1:8080/ws")
//!         .auth("token")
//!         .build()?;
//!
//!     client.hook(HookKind::Error, |event| {
//!         if let HookEvent::Error(e) = event {
//!             eprintln!("error: {e}");
//!         }
//!     });
//!     client.on("chat", |name, args| println!("{name}: {args:?}"));
//!
//!     client.connect();
//!     client.emit("chat", &[json!("hello")])?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`] facade and configuration |
//! | [`emitter`] | Named-event multiplexer |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire codec: batch envelope, app message, service frame |
//! | [`session`] | Session state machine and backoff |
//! | [`transport`] | Transport contract and WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Client facade.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Named-event multiplexer.
pub mod emitter;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for handlers and keepalive probes.
pub mod identifiers;

/// Wire codec.
///
/// Pure and stateless encoders/decoders for the three framing layers.
pub mod protocol;

/// Session state machine, lifecycle hooks and reconnection backoff.
pub mod session;

/// Transport contract and the WebSocket reference transport.
pub mod transport;

mod millis;
pub(crate) mod registry;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientConfig};

// Emitter types
pub use emitter::{Emitter, WILDCARD_EVENT};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{HandlerId, ProbeId};

// Protocol types
pub use protocol::{
    AppMessage, ArgCodec, JsonCodec, OpCode, ServiceFrame, decode_batch, encode_batch,
};

// Session types
pub use session::{HookEvent, HookKind, ReconnectionConfig, Reconnector, Session, SessionState};

// Transport types
pub use transport::{
    EventSink, Transport, TransportConfig, TransportEvent, TransportKind, WebSocketTransport,
};

//! Client facade.
//!
//! A [`Client`] bundles one [`Session`] with its [`Emitter`]: named events go
//! through the emitter, lifecycle calls go straight to the session.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::emitter::Emitter;
use crate::error::Result;
use crate::identifiers::HandlerId;
use crate::protocol::ArgCodec;
use crate::session::{HookEvent, HookKind, ReconnectionConfig, Reconnector, Session, SessionState};
use crate::transport::Transport;

use super::builder::ClientBuilder;
use super::options::ClientConfig;

// ============================================================================
// Client
// ============================================================================

/// Authenticated, auto-reconnecting event client.
///
/// Cloning shares the same session. The transport is closed when the last
/// clone is dropped.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use notify_client::Client;
///
/// # async fn example() -> notify_client::Result<()> {
/// let client = Client::builder()
///     .websocket("ws://127.0.0.1:8080/ws")
///     .auth("token")
///     .build()?;
///
/// client.on("chat", |_, args| println!("chat: {args:?}"));
/// client.connect();
/// client.emit("chat", &[json!("hello")])?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    session: Session,
    emitter: Emitter,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from a declarative configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if no transport is
    /// configured, or the transport configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        ClientBuilder::from_config(config).build()
    }

    pub(crate) fn from_parts(
        transport: Box<dyn Transport>,
        auth: String,
        reconnection: &ReconnectionConfig,
        codec: Arc<dyn ArgCodec>,
    ) -> Self {
        debug!(?reconnection, "Creating client");

        let session = Session::new(transport, auth, Reconnector::new(reconnection));
        let emitter = Emitter::with_codec(session.clone(), codec);
        Self { session, emitter }
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Starts connecting. See [`Session::connect`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[inline]
    pub fn connect(&self) {
        self.session.connect();
    }

    /// Closes for good. See [`Session::disconnect`].
    #[inline]
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Sends a raw payload, queued until the session is open.
    #[inline]
    pub fn send(&self, payload: impl Into<Vec<u8>>) {
        self.session.send(payload);
    }

    /// Registers a lifecycle hook.
    #[inline]
    pub fn hook<F>(&self, kind: HookKind, handler: F) -> HandlerId
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        self.session.hook(kind, handler)
    }

    /// Removes a lifecycle hook.
    #[inline]
    pub fn unhook(&self, kind: HookKind, id: HandlerId) -> bool {
        self.session.unhook(kind, id)
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Number of payloads waiting for the session to open.
    #[inline]
    #[must_use]
    pub fn queued(&self) -> usize {
        self.session.queued()
    }

    /// The underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// ============================================================================
// Client - Events
// ============================================================================

impl Client {
    /// Registers a named-event handler. See [`Emitter::on`].
    #[inline]
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&str, &[Value]) + Send + Sync + 'static,
    {
        self.emitter.on(name, handler)
    }

    /// Removes a named-event handler. See [`Emitter::off`].
    #[inline]
    pub fn off(&self, name: &str, id: HandlerId) -> bool {
        self.emitter.off(name, id)
    }

    /// Emits a named event. See [`Emitter::emit`].
    ///
    /// # Errors
    ///
    /// Fails locally, sending nothing, if the name or an argument is too long
    /// or an argument does not encode.
    #[inline]
    pub fn emit(&self, name: &str, args: &[Value]) -> Result<()> {
        self.emitter.emit(name, args)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Named-event multiplexer.
//!
//! Translates `emit(name, args)` into framed payloads sent through a
//! [`Session`], and routes incoming messages back to handlers registered by
//! name. Handlers registered under [`WILDCARD_EVENT`] receive every event
//! that has no handler of its own.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::identifiers::HandlerId;
use crate::protocol::{AppMessage, ArgCodec, JsonCodec};
use crate::registry::HandlerRegistry;
use crate::session::{HookEvent, HookKind, Session, WeakSession};

// ============================================================================
// Constants
// ============================================================================

/// Event name whose handlers catch every otherwise unhandled event.
pub const WILDCARD_EVENT: &str = "_";

// ============================================================================
// Types
// ============================================================================

/// Named-event handler: receives the event name and its decoded arguments.
pub type EventHandler = dyn Fn(&str, &[Value]) + Send + Sync;

struct EmitterShared {
    handlers: Mutex<HandlerRegistry<String, EventHandler>>,
    codec: Arc<dyn ArgCodec>,
}

// ============================================================================
// Emitter
// ============================================================================

/// Named-event routing over a session.
#[derive(Clone)]
pub struct Emitter {
    session: Session,
    shared: Arc<EmitterShared>,
}

impl Emitter {
    /// Creates an emitter using [`JsonCodec`] for arguments.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self::with_codec(session, Arc::new(JsonCodec))
    }

    /// Creates an emitter with a custom argument codec.
    ///
    /// Registers a `message` hook on `session`; the hook holds only weak
    /// references and becomes inert once the emitter is dropped.
    #[must_use]
    pub fn with_codec(session: Session, codec: Arc<dyn ArgCodec>) -> Self {
        let shared = Arc::new(EmitterShared {
            handlers: Mutex::new(HandlerRegistry::default()),
            codec,
        });

        let weak_shared = Arc::downgrade(&shared);
        let weak_session = session.downgrade();
        session.hook(HookKind::Message, move |event| {
            if let HookEvent::Message(bytes) = event {
                dispatch_incoming(&weak_shared, &weak_session, bytes);
            }
        });

        Self { session, shared }
    }

    /// Registers `handler` for `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&str, &[Value]) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().insert(name.into(), Arc::new(handler))
    }

    /// Removes the handler `id` from `name`.
    ///
    /// Returns `false` if it was not registered there.
    pub fn off(&self, name: &str, id: HandlerId) -> bool {
        self.shared.handlers.lock().remove(name, id)
    }

    /// Encodes `name` and `args` and sends the result through the session.
    ///
    /// Queued if the session is not open yet.
    ///
    /// # Errors
    ///
    /// - [`Error::EventNameTooLong`](crate::Error::EventNameTooLong) if `name` exceeds 255 bytes
    /// - [`Error::ArgumentTooLong`](crate::Error::ArgumentTooLong) if an encoded argument exceeds 65535 bytes
    /// - any codec error
    ///
    /// Nothing is sent on error.
    pub fn emit(&self, name: &str, args: &[Value]) -> Result<()> {
        let payload = AppMessage::encode_parts(name, args, self.shared.codec.as_ref())
            .inspect_err(|e| warn!(event = name, error = %e, "Emit failed"))?;

        trace!(event = name, args = args.len(), len = payload.len(), "Emitting");
        self.session.send(payload);
        Ok(())
    }

    /// Number of handlers registered for `name`.
    #[inline]
    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.shared.handlers.lock().count(name)
    }

    /// The underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// ============================================================================
// Incoming
// ============================================================================

fn dispatch_incoming(shared: &Weak<EmitterShared>, session: &WeakSession, bytes: &[u8]) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let message = match AppMessage::decode(bytes, shared.codec.as_ref()) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, len = bytes.len(), "Dropping undecodable message");
            if let Some(session) = session.upgrade() {
                session.report_error(&e);
            }
            return;
        }
    };

    let handlers = {
        let registry = shared.handlers.lock();
        let handlers = registry.snapshot(message.name.as_str());
        if handlers.is_empty() {
            registry.snapshot(WILDCARD_EVENT)
        } else {
            handlers
        }
    };

    if handlers.is_empty() {
        debug!(event = %message.name, "No handler for event");
        return;
    }

    for handler in handlers {
        handler(&message.name, &message.args);
    }
}

// ============================================================================
// Tests
// ============================================================================

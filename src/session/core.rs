//! Session state machine.
//!
//! A [`Session`] is a cheap, cloneable handle. The first `connect` spawns a
//! driver task that consumes the transport event stream and performs every
//! state transition; API calls take the same core lock, so state, queue and
//! transport are only ever touched by one party at a time. Hooks run with
//! no lock held.
//!
//! Every `connect` starts a new epoch. Events are tagged with the epoch of
//! the channel that produced them, and the driver discards anything from a
//! channel that has since been replaced. A pending reconnect is a deadline
//! the driver waits on next to the event stream, so the backoff never holds
//! back events from a channel opened by hand.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::HandlerId;
use crate::protocol::decode_batch;
use crate::registry::HandlerRegistry;
use crate::transport::{EventSink, TaggedEvent, Transport, TransportEvent};

use super::hooks::{HookEvent, HookHandler, HookKind};
use super::reconnector::Reconnector;
use super::state::SessionState;

// ============================================================================
// Types
// ============================================================================

/// Receiver and scheduler handed to the driver task on first connect.
struct DriverSeed {
    events_rx: mpsc::UnboundedReceiver<TaggedEvent>,
    reconnector: Reconnector,
}

/// State guarded by the core lock.
struct SessionCore {
    state: SessionState,
    queue: VecDeque<Vec<u8>>,
    transport: Box<dyn Transport>,
    /// Bumped on every connect. Events and pending reconnects from an older
    /// epoch are discarded.
    epoch: u64,
}

struct SessionInner {
    core: Mutex<SessionCore>,
    hooks: Mutex<HandlerRegistry<HookKind, HookHandler>>,
    credential: String,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    driver: Mutex<Option<DriverSeed>>,
}

// ============================================================================
// Session
// ============================================================================

/// Authenticated, auto-reconnecting connection over a [`Transport`].
///
/// # Thread Safety
///
/// `Session` is `Send + Sync` and cloning shares the same connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

/// Non-owning session handle.
#[derive(Clone)]
pub(crate) struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    pub(crate) fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }
}

impl Session {
    /// Creates an inert session; nothing happens before [`Session::connect`].
    pub fn new(
        transport: Box<dyn Transport>,
        credential: impl Into<String>,
        reconnector: Reconnector,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let inner = SessionInner {
            core: Mutex::new(SessionCore {
                state: SessionState::Closed,
                queue: VecDeque::new(),
                transport,
                epoch: 0,
            }),
            hooks: Mutex::new(HandlerRegistry::default()),
            credential: credential.into(),
            events_tx,
            driver: Mutex::new(Some(DriverSeed {
                events_rx,
                reconnector,
            })),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Starts (or restarts) establishing the channel.
    ///
    /// Idempotent: a no-op while the session is authenticating or open.
    /// Otherwise a channel still held is replaced, and a session closed by
    /// [`Session::disconnect`] or a rejected credential is re-armed for
    /// automatic reconnects.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect(&self) {
        if let Some(seed) = self.inner.driver.lock().take() {
            tokio::spawn(run_driver(
                Arc::downgrade(&self.inner),
                seed.events_rx,
                seed.reconnector,
            ));
        }

        let mut core = self.inner.core.lock();
        if matches!(core.state, SessionState::Authenticating | SessionState::Open) {
            debug!(state = %core.state, "Already connected, connect ignored");
            return;
        }

        debug!(state = %core.state, "Connect requested");
        core.state = SessionState::Closed;
        self.inner.connect_locked(&mut core);
    }

    /// Transmits `payload` once the session is open.
    ///
    /// While not open the payload is queued and flushed, in order, right
    /// after the next successful authentication. Never blocks, never fails.
    pub fn send(&self, payload: impl Into<Vec<u8>>) {
        let payload = payload.into();
        let mut core = self.inner.core.lock();

        if !core.state.is_open() {
            trace!(len = payload.len(), state = %core.state, "Payload queued");
            core.queue.push_back(payload);
            return;
        }

        if let Err(e) = core.transport.send(&payload) {
            warn!(error = %e, "Send failed, payload queued for the next open");
            core.queue.push_back(payload);
        }
    }

    /// Closes the session for good; no automatic reconnect follows.
    pub fn disconnect(&self) {
        let mut core = self.inner.core.lock();
        info!(state = %core.state, "Disconnecting");
        core.state = SessionState::ForciblyClosed;
        core.transport.close();
    }

    /// Registers a lifecycle hook.
    pub fn hook<F>(&self, kind: HookKind, handler: F) -> HandlerId
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        self.inner.hooks.lock().insert(kind, Arc::new(handler))
    }

    /// Removes a lifecycle hook.
    ///
    /// Returns `false` if `id` was not registered under `kind`.
    pub fn unhook(&self, kind: HookKind, id: HandlerId) -> bool {
        self.inner.hooks.lock().remove(&kind, id)
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.core.lock().state
    }

    /// Number of payloads waiting for the session to open.
    #[inline]
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.core.lock().queue.len()
    }

    /// Delivers `error` to the `error` hooks.
    pub(crate) fn report_error(&self, error: &Error) {
        self.inner.dispatch(&HookEvent::Error(error));
    }

    pub(crate) fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

// ============================================================================
// SessionInner - Transitions
// ============================================================================

impl SessionInner {
    fn connect_locked(&self, core: &mut SessionCore) {
        core.epoch += 1;
        let sink = EventSink::new(core.epoch, self.events_tx.clone());
        core.transport.connect(sink);
    }

    /// Locks the core if `epoch` still names the live channel.
    fn lock_current(&self, epoch: u64) -> Option<MutexGuard<'_, SessionCore>> {
        let core = self.core.lock();
        if core.epoch == epoch {
            Some(core)
        } else {
            trace!(epoch, current = core.epoch, "Stale channel event dropped");
            None
        }
    }

    /// Invokes the hooks registered for `event`, outside every lock.
    fn dispatch(&self, event: &HookEvent<'_>) {
        let handlers = self.hooks.lock().snapshot(&event.kind());
        for handler in handlers {
            handler(event);
        }
    }

    /// Returns `false` if the event came from a replaced channel.
    fn on_open(&self, epoch: u64, reconnector: &mut Reconnector) -> bool {
        let result = {
            let Some(mut core) = self.lock_current(epoch) else {
                return false;
            };
            core.state = SessionState::Authenticating;
            core.transport.authenticate(&self.credential)
        };
        reconnector.reset();

        match result {
            Ok(()) => debug!("Channel open, authenticating"),
            Err(e) => {
                warn!(error = %e, "Failed to send credential");
                self.dispatch(&HookEvent::Error(&e));
            }
        }
        true
    }

    fn on_auth(&self, epoch: u64, result: Result<()>) {
        match result {
            Ok(()) => {
                let (flushed, requeued) = {
                    let Some(mut core) = self.lock_current(epoch) else {
                        return;
                    };
                    core.state = SessionState::Open;
                    Self::flush_locked(&mut core)
                };
                info!(flushed, requeued, "Session open");
                self.dispatch(&HookEvent::Open);
            }

            Err(e) => {
                {
                    let Some(mut core) = self.lock_current(epoch) else {
                        return;
                    };
                    core.state = SessionState::ForciblyClosed;
                    core.transport.close();
                }
                warn!(error = %e, "Authentication rejected, reconnect disabled");
                self.dispatch(&HookEvent::Error(&e));
            }
        }
    }

    /// Sends every queued payload; failures stay queued in order.
    fn flush_locked(core: &mut SessionCore) -> (usize, usize) {
        let pending = std::mem::take(&mut core.queue);
        let mut flushed = 0;

        for payload in pending {
            match core.transport.send(&payload) {
                Ok(()) => flushed += 1,
                Err(e) => {
                    debug!(error = %e, len = payload.len(), "Flush failed, payload kept");
                    core.queue.push_back(payload);
                }
            }
        }

        (flushed, core.queue.len())
    }

    fn on_message(&self, epoch: u64, batch: &[u8]) {
        if self.lock_current(epoch).is_none() {
            return;
        }
        for message in decode_batch(batch) {
            self.dispatch(&HookEvent::Message(message));
        }
    }

    fn on_error(&self, epoch: u64, error: &Error) {
        if self.lock_current(epoch).is_none() {
            return;
        }
        debug!(error = %error, "Transport error");
        self.dispatch(&HookEvent::Error(error));
    }

    /// Returns the epoch to reconnect from, or `None` if no reconnect is due.
    fn on_close(&self, epoch: u64) -> Option<u64> {
        let previous = {
            let mut core = self.lock_current(epoch)?;
            let previous = core.state;
            core.state = SessionState::Closed;
            previous
        };

        info!(previous = %previous, "Channel closed");
        self.dispatch(&HookEvent::Close);

        previous.reconnects_on_close().then_some(epoch)
    }

    fn reconnect(&self, epoch: u64) {
        let mut core = self.core.lock();

        if core.state == SessionState::ForciblyClosed {
            debug!("Disconnected during backoff, reconnect skipped");
            return;
        }
        if core.epoch != epoch {
            debug!("Connected during backoff, reconnect skipped");
            return;
        }

        info!("Reconnecting");
        self.connect_locked(&mut core);
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.core.get_mut().transport.close();
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Automatic reconnect waiting for its backoff delay.
struct PendingReconnect {
    epoch: u64,
    delay: Pin<Box<Sleep>>,
}

enum Step {
    Event(TaggedEvent),
    Reconnect(u64),
}

/// Resolves once the pending reconnect is due, or never without one.
async fn reconnect_due(pending: &mut Option<PendingReconnect>) -> u64 {
    match pending {
        Some(pending) => {
            pending.delay.as_mut().await;
            pending.epoch
        }
        None => std::future::pending().await,
    }
}

/// Consumes transport events until the session is dropped.
async fn run_driver(
    session: Weak<SessionInner>,
    mut events_rx: mpsc::UnboundedReceiver<TaggedEvent>,
    mut reconnector: Reconnector,
) {
    debug!("Session driver started");
    let mut pending: Option<PendingReconnect> = None;

    loop {
        let step = tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => Step::Event(event),
                None => break,
            },
            epoch = reconnect_due(&mut pending) => Step::Reconnect(epoch),
        };

        let Some(inner) = session.upgrade() else {
            break;
        };

        let (epoch, event) = match step {
            Step::Reconnect(epoch) => {
                pending = None;
                inner.reconnect(epoch);
                continue;
            }
            Step::Event(tagged) => tagged,
        };

        match event {
            TransportEvent::Open => {
                if inner.on_open(epoch, &mut reconnector) && pending.take().is_some() {
                    debug!("Channel opened during backoff, pending reconnect dropped");
                }
            }
            TransportEvent::Message(batch) => inner.on_message(epoch, &batch),
            TransportEvent::Auth(result) => inner.on_auth(epoch, result),
            TransportEvent::Error(e) => inner.on_error(epoch, &e),

            TransportEvent::Close => {
                let Some(epoch) = inner.on_close(epoch) else {
                    continue;
                };

                match reconnector.advance() {
                    Ok(delay) => {
                        pending = Some(PendingReconnect {
                            epoch,
                            delay: Box::pin(sleep(delay)),
                        });
                    }
                    Err(e) => warn!(error = %e, "Reconnect abandoned"),
                }
            }
        }
    }

    debug!("Session driver terminated");
}

// ============================================================================
// Tests
// ============================================================================

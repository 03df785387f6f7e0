//! Keepalive probe bookkeeping.
//!
//! Pure state machine driven by the channel task: it never sleeps itself,
//! it only says when the next deadline is and what to do once it passes.
//!
//! ```text
//!  start ──► [ping scheduled] ──deadline──► SendPing(id) ──► [probe pending]
//!                  ▲                                             │
//!                  └────────── matching Pong (latency) ◄─────────┤
//!                                                                │
//!                                   deadline ──► TimedOut(id) ──► [stopped]
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::time::Instant;

use crate::identifiers::ProbeId;

// ============================================================================
// KeepAliveAction
// ============================================================================

/// What the channel task must do after a deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeepAliveAction {
    /// Write a `Ping` frame carrying this id.
    SendPing(ProbeId),
    /// This probe went unanswered; report it and stop probing.
    TimedOut(ProbeId),
}

// ============================================================================
// KeepAlive
// ============================================================================

/// One outstanding probe.
#[derive(Debug, Clone, Copy)]
struct PendingProbe {
    sent_at: Instant,
    deadline: Instant,
}

/// Probe scheduler for one channel.
#[derive(Debug)]
pub(crate) struct KeepAlive {
    interval: Duration,
    timeout: Duration,
    last_id: ProbeId,
    next_ping: Option<Instant>,
    pending: FxHashMap<ProbeId, PendingProbe>,
}

impl KeepAlive {
    /// Creates an idle scheduler; nothing happens before [`KeepAlive::start`].
    pub(crate) fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            last_id: ProbeId::new(0),
            next_ping: None,
            pending: FxHashMap::default(),
        }
    }

    /// Schedules the first probe one interval after `now`.
    pub(crate) fn start(&mut self, now: Instant) {
        self.next_ping = Some(now + self.interval);
    }

    /// Returns the timeout reported for unanswered probes.
    #[inline]
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Earliest instant at which [`KeepAlive::poll`] has work to do.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        let probe_deadline = self.pending.values().map(|p| p.deadline).min();
        match (self.next_ping, probe_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the next due action, if any. Call until it returns `None`.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<KeepAliveAction> {
        if self.next_ping.is_some_and(|at| at <= now) {
            self.next_ping = None;
            self.last_id = self.last_id.succ();
            self.pending.insert(
                self.last_id,
                PendingProbe {
                    sent_at: now,
                    deadline: now + self.timeout,
                },
            );
            return Some(KeepAliveAction::SendPing(self.last_id));
        }

        let expired = self
            .pending
            .iter()
            .filter(|(_, probe)| probe.deadline <= now)
            .map(|(id, _)| *id)
            .min()?;
        self.pending.remove(&expired);
        Some(KeepAliveAction::TimedOut(expired))
    }

    /// Resolves the probe named by a `Pong` payload.
    ///
    /// Returns the round-trip time and schedules the next probe, or `None`
    /// if the payload matches no pending probe (late or unknown answer).
    pub(crate) fn on_pong(&mut self, payload: &str, now: Instant) -> Option<Duration> {
        let id: ProbeId = payload.parse().ok()?;
        let probe = self.pending.remove(&id)?;
        self.next_ping = Some(now + self.interval);
        Some(now.saturating_duration_since(probe.sent_at))
    }

    /// Number of probes awaiting an answer.
    #[inline]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if another ping is scheduled.
    #[inline]
    pub(crate) fn is_scheduled(&self) -> bool {
        self.next_ping.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

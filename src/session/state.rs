//! Session lifecycle state.

use std::fmt;

/// Lifecycle state of a session.
///
/// ```text
///            connect()            transport open          auth ok
///  Closed ──────────────► Closed ───────────────► Authenticating ──────► Open
///    ▲                                                 │                  │
///    │ transport close              auth failure       ▼   disconnect()   │
///    └──────────────────────────────────────── ForciblyClosed ◄───────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No channel, or the channel is still being established.
    #[default]
    Closed,
    /// Channel open, credential sent, waiting for the answer.
    Authenticating,
    /// Authenticated; sends go straight to the transport.
    Open,
    /// Disconnected by the user or rejected by the server; no auto-reconnect
    /// until the next explicit connect.
    ForciblyClosed,
}

impl SessionState {
    /// Returns `true` if payloads are transmitted immediately.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if a transport close will be followed by a reconnect.
    #[inline]
    #[must_use]
    pub const fn reconnects_on_close(self) -> bool {
        !matches!(self, Self::ForciblyClosed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Authenticating => "authenticating",
            Self::Open => "open",
            Self::ForciblyClosed => "forcibly-closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_closed() {
        assert_eq!(SessionState::default(), SessionState::Closed);
    }

    #[test]
    fn test_only_forcibly_closed_suppresses_reconnect() {
        assert!(SessionState::Closed.reconnects_on_close());
        assert!(SessionState::Authenticating.reconnects_on_close());
        assert!(SessionState::Open.reconnects_on_close());
        assert!(!SessionState::ForciblyClosed.reconnects_on_close());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::ForciblyClosed.to_string(), "forcibly-closed");
        assert!(SessionState::Open.is_open());
        assert!(!SessionState::Authenticating.is_open());
    }
}

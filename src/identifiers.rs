//! Type-safe identifier wrappers.
//!
//! Newtypes keep handler tokens and keepalive probe ids from being mixed up
//! with each other or with plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// HandlerId
// ============================================================================

/// Global counter for handler registrations.
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Token returned when a handler is registered.
///
/// Pass it back to `unhook` / `off` to remove exactly that handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Allocates a process-unique handler id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ProbeId
// ============================================================================

/// Identifier of one keepalive probe.
///
/// Travels on the wire as the decimal payload of `Ping` and `Pong` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeId(u64);

impl ProbeId {
    /// Wraps a raw probe number.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one.
    #[inline]
    #[must_use]
    pub const fn succ(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProbeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_ids_are_unique() {
        let a = HandlerId::next();
        let b = HandlerId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_probe_id_wire_format() {
        let id = ProbeId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!("7".parse::<ProbeId>().unwrap(), id);
        assert_eq!(id.succ(), ProbeId::new(8));
    }

    #[test]
    fn test_probe_id_rejects_garbage() {
        assert!("seven".parse::<ProbeId>().is_err());
        assert!("".parse::<ProbeId>().is_err());
    }
}

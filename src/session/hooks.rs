//! Lifecycle hooks.

use crate::error::Error;

/// Lifecycle event a hook can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Session authenticated and open.
    Open,
    /// One application message arrived.
    Message,
    /// Underlying channel closed.
    Close,
    /// Transport, authentication or decode failure.
    Error,
}

/// Payload delivered to a hook.
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    /// Session authenticated and open.
    Open,
    /// One entry of an incoming batch envelope.
    Message(&'a [u8]),
    /// Underlying channel closed.
    Close,
    /// A reported failure.
    Error(&'a Error),
}

impl HookEvent<'_> {
    /// Returns the kind this event is dispatched under.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> HookKind {
        match self {
            Self::Open => HookKind::Open,
            Self::Message(_) => HookKind::Message,
            Self::Close => HookKind::Close,
            Self::Error(_) => HookKind::Error,
        }
    }
}

/// Hook callback.
pub type HookHandler = dyn Fn(&HookEvent<'_>) + Send + Sync;

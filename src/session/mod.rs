//! Authenticated, auto-reconnecting session.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | State machine over a [`Transport`](crate::transport::Transport) |
//! | [`SessionState`] | Lifecycle state |
//! | [`HookKind`] / [`HookEvent`] | Lifecycle hooks |
//! | [`Reconnector`] | Backoff scheduler |
//! | [`ReconnectionConfig`] | Backoff policy |

// ============================================================================
// Submodules
// ============================================================================

/// Session state machine and driver task.
pub mod core;

/// Lifecycle hook kinds and payloads.
pub mod hooks;

/// Reconnection backoff.
pub mod reconnector;

/// Lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Session;
pub(crate) use self::core::WeakSession;
pub use hooks::{HookEvent, HookHandler, HookKind};
pub use reconnector::{GrowthFn, ReconnectionConfig, Reconnector};
pub use state::SessionState;

//! Named-event multiplexer over a session.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//!
//! let emitter = Emitter::new(session);
//! emitter.on("chat", |_, args| println!("chat: {args:?}"));
//! emitter.emit("chat", &[json!("hello")])?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Emitter implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Emitter, EventHandler, WILDCARD_EVENT};

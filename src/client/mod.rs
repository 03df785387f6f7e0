//! Public client facade.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Session plus emitter behind one handle |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientConfig`] | Declarative configuration |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Client facade.
pub mod core;

/// Declarative configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use self::core::Client;
pub use options::ClientConfig;

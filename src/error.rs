//! Error types for the notify client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Construction and local encoding return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use notify_client::{Client, Result};
//! use serde_json::json;
//!
//! fn example(client: &Client) -> Result<()> {
//!     client.emit("chat.message", &[json!("hello")])?;
//!     Ok(())
//! }
//! ```
//!
//! Runtime failures (transport drops, decode failures, keepalive timeouts)
//! never surface through a return value. They are delivered to the
//! `error` hook of the session instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::KeepaliveTimeout`] |
//! | Session | [`Error::Authentication`], [`Error::RetriesExhausted`] |
//! | Codec | [`Error::Decode`], [`Error::EventNameTooLong`], [`Error::ArgumentTooLong`], [`Error::BatchEntryTooLong`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::ProbeId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned at construction time when the client configuration is
    /// invalid, e.g. no transport was given.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Channel-level failure.
    ///
    /// Non-fatal: the session keeps reconnecting.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// No open channel is available.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A keepalive probe was not answered in time.
    #[error("Keepalive probe {probe_id} unanswered after {timeout_ms}ms")]
    KeepaliveTimeout {
        /// The unanswered probe.
        probe_id: ProbeId,
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The remote end rejected the credential.
    ///
    /// Fatal to the session: auto-reconnect is disabled afterwards.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Payload of the rejecting acknowledgement.
        message: String,
    },

    /// The reconnection budget is spent.
    #[error("Reconnection retries exhausted after {max_retries} attempts")]
    RetriesExhausted {
        /// Configured retry bound.
        max_retries: u32,
    },

    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Malformed frame or message.
    ///
    /// The offending unit is skipped; siblings in the same batch are still
    /// processed.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the malformation.
        message: String,
    },

    /// Event name does not fit the 1-byte length prefix.
    #[error("Event name is {len} bytes, maximum is 255")]
    EventNameTooLong {
        /// Length of the rejected name in bytes.
        len: usize,
    },

    /// Encoded argument does not fit the 2-byte length prefix.
    #[error("Encoded argument is {len} bytes, maximum is 65535")]
    ArgumentTooLong {
        /// Length of the rejected argument in bytes.
        len: usize,
    },

    /// Batch entry does not fit the 4-byte length prefix.
    #[error("Batch entry is {len} bytes, maximum is 4294967295")]
    BatchEntryTooLong {
        /// Length of the rejected entry in bytes.
        len: usize,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Invalid transport URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a keepalive timeout error.
    #[inline]
    pub fn keepalive_timeout(probe_id: ProbeId, timeout_ms: u64) -> Self {
        Self::KeepaliveTimeout {
            probe_id,
            timeout_ms,
        }
    }

    /// Creates an authentication error.
    #[inline]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a retries exhausted error.
    #[inline]
    pub fn retries_exhausted(max_retries: u32) -> Self {
        Self::RetriesExhausted { max_retries }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an event name too long error.
    #[inline]
    pub fn event_name_too_long(len: usize) -> Self {
        Self::EventNameTooLong { len }
    }

    /// Creates an argument too long error.
    #[inline]
    pub fn argument_too_long(len: usize) -> Self {
        Self::ArgumentTooLong { len }
    }

    /// Creates a batch entry too long error.
    #[inline]
    pub fn batch_entry_too_long(len: usize) -> Self {
        Self::BatchEntryTooLong { len }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error ends the session for good.
    ///
    /// Only a rejected credential is fatal; the session will not reconnect.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::KeepaliveTimeout { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a decode error.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Json(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are handled by the reconnect loop.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::KeepaliveTimeout { .. }
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

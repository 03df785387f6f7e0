//! Declarative transport configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use notify_client::TransportConfig;
//!
//! let config = TransportConfig::websocket("ws://127.0.0.1:8080/ws")
//!     .with_ping_interval(Duration::from_secs(10))
//!     .with_on_latency(|rtt| println!("rtt {rtt:?}"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

use super::{Transport, WebSocketTransport};

// ============================================================================
// Constants
// ============================================================================

/// Default delay between keepalive probes.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Default time to wait for a probe's answer.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// Receives the round-trip time of every answered keepalive probe.
pub type LatencyCallback = Arc<dyn Fn(Duration) + Send + Sync>;

// ============================================================================
// TransportKind
// ============================================================================

/// Which built-in transport to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub enum TransportKind {
    /// WebSocket with the opcode service protocol.
    #[default]
    #[serde(rename = "ws", alias = "websocket")]
    WebSocket,
}

// ============================================================================
// TransportConfig
// ============================================================================

/// Configuration of a built-in transport.
#[derive(Clone, Deserialize)]
pub struct TransportConfig {
    /// Transport implementation.
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: TransportKind,

    /// Endpoint, e.g. `ws://host:port/path`.
    pub url: String,

    /// Delay between keepalive probes (milliseconds when deserialized).
    #[serde(
        default = "default_ping_interval",
        deserialize_with = "crate::millis::deserialize"
    )]
    pub ping_interval: Duration,

    /// Time to wait for a probe's answer (milliseconds when deserialized).
    #[serde(
        default = "default_ping_timeout",
        deserialize_with = "crate::millis::deserialize"
    )]
    pub ping_timeout: Duration,

    /// Optional round-trip observer.
    #[serde(skip)]
    pub on_latency: Option<LatencyCallback>,
}

fn default_ping_interval() -> Duration {
    DEFAULT_PING_INTERVAL
}

fn default_ping_timeout() -> Duration {
    DEFAULT_PING_TIMEOUT
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportConfig {
    /// Creates a WebSocket configuration with default keepalive timings.
    #[must_use]
    pub fn websocket(url: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::WebSocket,
            url: url.into(),
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            on_latency: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportConfig {
    /// Sets the delay between keepalive probes.
    #[inline]
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Sets the time to wait for a probe's answer.
    #[inline]
    #[must_use]
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Sets the round-trip observer.
    #[inline]
    #[must_use]
    pub fn with_on_latency<F>(mut self, callback: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.on_latency = Some(Arc::new(callback));
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl TransportConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `url` does not parse
    /// - [`Error::Config`] for an unsupported scheme or a zero timing
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;

        match self.kind {
            TransportKind::WebSocket => {
                if !matches!(url.scheme(), "ws" | "wss") {
                    return Err(Error::config(format!(
                        "WebSocket transport needs a ws:// or wss:// URL, got {}://",
                        url.scheme()
                    )));
                }
            }
        }

        if self.ping_interval.is_zero() || self.ping_timeout.is_zero() {
            return Err(Error::config("Keepalive timings must be greater than zero"));
        }

        Ok(url)
    }

    /// Builds the configured transport.
    ///
    /// # Errors
    ///
    /// See [`TransportConfig::validate`].
    pub fn build(&self) -> Result<Box<dyn Transport>> {
        let url = self.validate()?;

        match self.kind {
            TransportKind::WebSocket => Ok(Box::new(
                WebSocketTransport::new(url)
                    .with_keepalive(self.ping_interval, self.ping_timeout)
                    .with_latency_callback(self.on_latency.clone()),
            )),
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("ping_interval", &self.ping_interval)
            .field("ping_timeout", &self.ping_timeout)
            .field("on_latency", &self.on_latency.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

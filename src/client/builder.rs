//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use notify_client::{Client, ReconnectionConfig};
//!
//! # fn example() -> notify_client::Result<()> {
//! let client = Client::builder()
//!     .websocket("ws://127.0.0.1:8080/ws")
//!     .auth("token")
//!     .reconnection(ReconnectionConfig::new().with_max_retries(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::{ArgCodec, JsonCodec};
use crate::session::ReconnectionConfig;
use crate::transport::{Transport, TransportConfig};

use super::core::Client;
use super::options::ClientConfig;

// ============================================================================
// Types
// ============================================================================

enum TransportSource {
    Config(TransportConfig),
    Custom(Box<dyn Transport>),
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`].
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<TransportSource>,
    auth: String,
    reconnection: ReconnectionConfig,
    codec: Option<Arc<dyn ArgCodec>>,
}

impl ClientBuilder {
    /// Creates a builder with no transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a declarative configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            transport: config.transport.map(TransportSource::Config),
            auth: config.auth,
            reconnection: config.reconnection,
            codec: None,
        }
    }

    /// Uses the WebSocket transport with default keepalive timings.
    #[inline]
    #[must_use]
    pub fn websocket(self, url: impl Into<String>) -> Self {
        self.transport_config(TransportConfig::websocket(url))
    }

    /// Uses a built-in transport described by `config`.
    #[inline]
    #[must_use]
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport = Some(TransportSource::Config(config));
        self
    }

    /// Uses a custom transport implementation.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(TransportSource::Custom(Box::new(transport)));
        self
    }

    /// Sets the credential.
    #[inline]
    #[must_use]
    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = auth.into();
        self
    }

    /// Sets the backoff policy.
    #[inline]
    #[must_use]
    pub fn reconnection(mut self, reconnection: ReconnectionConfig) -> Self {
        self.reconnection = reconnection;
        self
    }

    /// Sets the argument codec (JSON by default).
    #[inline]
    #[must_use]
    pub fn codec(mut self, codec: impl ArgCodec) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Builds the client. Nothing connects until [`Client::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no transport is set
    /// - any error of [`TransportConfig::validate`]
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(TransportSource::Config(config)) => config.build()?,
            Some(TransportSource::Custom(transport)) => transport,
            None => {
                return Err(Error::config(
                    "Transport is required. Use .websocket() or .transport() to set it.\n\
                     Example: Client::builder().websocket(\"ws://127.0.0.1:8080/ws\")",
                ));
            }
        };

        let codec = self.codec.unwrap_or_else(|| Arc::new(JsonCodec));
        Ok(Client::from_parts(transport, self.auth, &self.reconnection, codec))
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = match &self.transport {
            Some(TransportSource::Config(config)) => config.url.as_str(),
            Some(TransportSource::Custom(_)) => "custom",
            None => "none",
        };

        f.debug_struct("ClientBuilder")
            .field("transport", &transport)
            .field("reconnection", &self.reconnection)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

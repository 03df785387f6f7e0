//! Declarative client configuration.
//!
//! # Example
//!
//! ```ignore
//! use notify_client::ClientConfig;
//!
//! let config: ClientConfig = serde_json::from_str(r#"{
//!     "transport": { "type": "ws", "url": "ws://127.0.0.1:8080/ws" },
//!     "auth": "token",
//!     "reconnection": { "initial_delay": 500, "max_retries": 5 }
//! }"#)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::ReconnectionConfig;
use crate::transport::TransportConfig;

// ============================================================================
// ClientConfig
// ============================================================================

/// Everything needed to construct a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Transport descriptor. Required.
    pub transport: Option<TransportConfig>,

    /// Credential sent in the authentication request.
    pub auth: String,

    /// Backoff policy.
    pub reconnection: ReconnectionConfig,
}

impl ClientConfig {
    /// Creates a configuration for `transport` with an empty credential and
    /// the default backoff policy.
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    /// Sets the credential.
    #[inline]
    #[must_use]
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = auth.into();
        self
    }

    /// Sets the backoff policy.
    #[inline]
    #[must_use]
    pub fn with_reconnection(mut self, reconnection: ReconnectionConfig) -> Self {
        self.reconnection = reconnection;
        self
    }

    /// Checks the configuration and returns the transport descriptor.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no transport is given
    /// - any error of [`TransportConfig::validate`]
    pub fn validate(&self) -> Result<&TransportConfig> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            Error::config(
                "Transport is required. Set `transport` or use ClientBuilder::websocket().\n\
                 Example: Client::builder().websocket(\"ws://127.0.0.1:8080/ws\")",
            )
        })?;

        transport.validate()?;
        Ok(transport)
    }
}

// ============================================================================
// Tests
// ============================================================================

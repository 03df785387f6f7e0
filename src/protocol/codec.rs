//! Argument value codecs.
//!
//! Every argument of an application message is encoded independently into
//! its own length-prefixed segment. The codec decides what the bytes of one
//! segment look like; the default is one JSON document per segment.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Debug;

use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// ArgCodec
// ============================================================================

/// Encodes and decodes a single argument value.
///
/// Implementations must be stateless or internally synchronized; one codec
/// instance is shared by every emit and every incoming message.
pub trait ArgCodec: Debug + Send + Sync + 'static {
    /// Encodes one value into the bytes of one segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decodes the bytes of one segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] or [`Error::Json`] on malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

// ============================================================================
// JsonCodec
// ============================================================================

/// Default codec: one JSON value per segment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec;

impl ArgCodec for JsonCodec {
    #[inline]
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    #[inline]
    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            return Err(Error::decode("empty argument segment"));
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

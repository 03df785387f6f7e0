//! Named application message.
//!
//! # Format
//!
//! ```text
//! [N: u8][N bytes UTF-8 event name]([M: u16 LE][M bytes argument])*
//! ```
//!
//! Argument segments repeat until the message is exhausted. Each segment
//! holds exactly one value in the encoding of the configured [`ArgCodec`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

use super::codec::ArgCodec;

// ============================================================================
// Constants
// ============================================================================

/// Longest event name the 1-byte prefix can describe.
pub const MAX_EVENT_NAME_LEN: usize = u8::MAX as usize;

/// Longest encoded argument the 2-byte prefix can describe.
pub const MAX_ARGUMENT_LEN: usize = u16::MAX as usize;

/// Width of the argument length prefix.
const ARG_PREFIX_LEN: usize = 2;

// ============================================================================
// AppMessage
// ============================================================================

/// One named event with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMessage {
    /// Event name.
    pub name: String,

    /// Decoded argument values, in order.
    pub args: Vec<Value>,
}

impl AppMessage {
    /// Creates a new message.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Encodes `name` and `args` without building an owned message first.
    ///
    /// # Errors
    ///
    /// - [`Error::EventNameTooLong`] if `name` exceeds 255 bytes
    /// - [`Error::ArgumentTooLong`] if an encoded argument exceeds 65535 bytes
    /// - any error of `codec` while encoding an argument
    pub fn encode_parts(name: &str, args: &[Value], codec: &dyn ArgCodec) -> Result<Vec<u8>> {
        let name_len = u8::try_from(name.len()).map_err(|_| Error::event_name_too_long(name.len()))?;

        let mut out = Vec::with_capacity(1 + name.len() + args.len() * 16);
        out.push(name_len);
        out.extend_from_slice(name.as_bytes());

        for arg in args {
            let encoded = codec.encode(arg)?;
            let len =
                u16::try_from(encoded.len()).map_err(|_| Error::argument_too_long(encoded.len()))?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&encoded);
        }

        Ok(out)
    }

    /// Encodes this message.
    ///
    /// # Errors
    ///
    /// See [`AppMessage::encode_parts`].
    #[inline]
    pub fn encode(&self, codec: &dyn ArgCodec) -> Result<Vec<u8>> {
        Self::encode_parts(&self.name, &self.args, codec)
    }

    /// Decodes one batch entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the entry is empty, the name is
    /// truncated or not UTF-8, or a segment is truncated; codec errors are
    /// passed through.
    pub fn decode(bytes: &[u8], codec: &dyn ArgCodec) -> Result<Self> {
        let (&name_len, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::decode("empty application message"))?;
        let name_len = usize::from(name_len);

        if rest.len() < name_len {
            return Err(Error::decode(format!(
                "event name truncated: declared {name_len} bytes, {} available",
                rest.len()
            )));
        }

        let (name, mut rest) = rest.split_at(name_len);
        let name = std::str::from_utf8(name)
            .map_err(|e| Error::decode(format!("event name is not UTF-8: {e}")))?;

        let mut args = Vec::new();
        while !rest.is_empty() {
            let (header, body) = rest
                .split_first_chunk::<ARG_PREFIX_LEN>()
                .ok_or_else(|| Error::decode("argument length prefix truncated"))?;
            let len = usize::from(u16::from_le_bytes(*header));

            if body.len() < len {
                return Err(Error::decode(format!(
                    "argument {} truncated: declared {len} bytes, {} available",
                    args.len(),
                    body.len()
                )));
            }

            let (segment, tail) = body.split_at(len);
            args.push(codec.decode(segment)?);
            rest = tail;
        }

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

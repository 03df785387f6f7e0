//! Service frames of the socket transport.
//!
//! Every frame on the socket starts with one opcode byte followed by the
//! opcode's payload:
//!
//! | Opcode | Value | Payload |
//! |--------|-------|---------|
//! | `Message` | 1 | batch envelope |
//! | `Ping` | 2 | decimal probe id |
//! | `Pong` | 3 | echoed probe id |
//! | `AuthAck` | 4 | `"ok"` on success, anything else on failure |
//! | `AuthReq` | 5 | credential |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// `AuthAck` payload meaning the credential was accepted.
pub const AUTH_OK: &[u8] = b"ok";

// ============================================================================
// OpCode
// ============================================================================

/// Purpose of a service frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Application data (a batch envelope).
    Message = 1,
    /// Keepalive probe.
    Ping = 2,
    /// Keepalive answer.
    Pong = 3,
    /// Authentication result.
    AuthAck = 4,
    /// Authentication request.
    AuthReq = 5,
}

impl OpCode {
    /// Returns the wire byte.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(Self::Message),
            2 => Ok(Self::Ping),
            3 => Ok(Self::Pong),
            4 => Ok(Self::AuthAck),
            5 => Ok(Self::AuthReq),
            other => Err(Error::decode(format!("unknown opcode {other}"))),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::AuthAck => "auth-ack",
            Self::AuthReq => "auth-req",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ServiceFrame
// ============================================================================

/// A decoded service frame borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceFrame<'a> {
    /// Frame purpose.
    pub opcode: OpCode,

    /// Everything after the opcode byte.
    pub payload: &'a [u8],
}

impl<'a> ServiceFrame<'a> {
    /// Creates a frame view.
    #[inline]
    #[must_use]
    pub const fn new(opcode: OpCode, payload: &'a [u8]) -> Self {
        Self { opcode, payload }
    }

    /// Encodes a frame into a fresh buffer.
    #[must_use]
    pub fn encode(opcode: OpCode, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(opcode.as_u8());
        out.extend_from_slice(payload);
        out
    }

    /// Decodes a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `bytes` is empty or the opcode is
    /// unknown.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let (&code, payload) = bytes
            .split_first()
            .ok_or_else(|| Error::decode("empty service frame"))?;
        Ok(Self {
            opcode: OpCode::try_from(code)?,
            payload,
        })
    }

    /// Returns `true` if this is an `AuthAck` accepting the credential.
    #[inline]
    #[must_use]
    pub fn is_auth_ok(&self) -> bool {
        self.opcode == OpCode::AuthAck && self.payload == AUTH_OK
    }

    /// Returns the payload as text, replacing invalid UTF-8.
    #[inline]
    #[must_use]
    pub fn payload_text(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.payload)
    }
}

// ============================================================================
// Tests
// ============================================================================

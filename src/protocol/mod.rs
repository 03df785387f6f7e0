//! Wire protocol: the three framing layers.
//!
//! All functions here are pure and stateless, safe to call from any task.
//!
//! # Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Service frame    [opcode u8][payload ...]                 │  socket transport only
//! │  └─ Batch        [len u32 LE][message] [len u32 LE][...]  │  payload of Message=1
//! │      └─ Message  [N u8][name][len u16 LE][arg] ...        │  one batch entry
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `batch` | Length-prefixed batch envelope |
//! | `codec` | Pluggable argument codec (JSON by default) |
//! | `frame` | Service opcodes and frames |
//! | `message` | Named application message |

// ============================================================================
// Submodules
// ============================================================================

/// Batch envelope encoding.
pub mod batch;

/// Argument value codecs.
pub mod codec;

/// Service frame opcodes.
pub mod frame;

/// Application message encoding.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use batch::{BatchIter, decode_batch, encode_batch};
pub use codec::{ArgCodec, JsonCodec};
pub use frame::{OpCode, ServiceFrame};
pub use message::{AppMessage, MAX_ARGUMENT_LEN, MAX_EVENT_NAME_LEN};

//! Batch envelope.
//!
//! A batch is the concatenation of zero or more entries, each
//! `[u32 little-endian length L][L bytes]`. The server packs several
//! application messages into one transport frame this way.
//!
//! Decoding stops as soon as fewer than four bytes remain. An entry whose
//! declared length runs past the end of the buffer is discarded as well.

// ============================================================================
// Imports
// ============================================================================

use std::iter::FusedIterator;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Width of the per-entry length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

// ============================================================================
// Encoding
// ============================================================================

/// Packs messages into one batch envelope, preserving order.
///
/// # Errors
///
/// Returns [`Error::BatchEntryTooLong`] if a message does not fit the
/// 4-byte length prefix.
///
/// # Example
///
/// ```ignore
/// let batch = encode_batch(["a", "bb"])?;
/// assert_eq!(batch, b"\x01\0\0\0a\x02\0\0\0bb");
/// ```
pub fn encode_batch<I, M>(messages: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for message in messages {
        let message = message.as_ref();
        out.extend_from_slice(&entry_prefix(message.len())?);
        out.extend_from_slice(message);
    }
    Ok(out)
}

/// Length prefix for an entry of `len` bytes.
#[inline]
fn entry_prefix(len: usize) -> Result<[u8; LENGTH_PREFIX_LEN]> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| Error::batch_entry_too_long(len))
}

// ============================================================================
// Decoding
// ============================================================================

/// Splits a batch envelope into its entries without copying.
#[inline]
#[must_use]
pub fn decode_batch(buffer: &[u8]) -> BatchIter<'_> {
    BatchIter { rest: buffer }
}

/// Iterator over the entries of a batch envelope.
///
/// Created by [`decode_batch`].
#[derive(Debug, Clone)]
pub struct BatchIter<'a> {
    rest: &'a [u8],
}

impl<'a> BatchIter<'a> {
    /// Returns the bytes not consumed yet.
    #[inline]
    #[must_use]
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for BatchIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (header, body) = self.rest.split_first_chunk::<LENGTH_PREFIX_LEN>()?;
        let len = u32::from_le_bytes(*header) as usize;

        if body.len() < len {
            self.rest = &[];
            return None;
        }

        let (entry, rest) = body.split_at(len);
        self.rest = rest;
        Some(entry)
    }
}

impl FusedIterator for BatchIter<'_> {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_round_trip_preserves_order() {
        let batch = encode_batch(["a", "bb", "ccc"]).unwrap();
        let entries: Vec<&[u8]> = decode_batch(&batch).collect();
        assert_eq!(
            entries,
            vec![b"a".as_slice(), b"bb".as_slice(), b"ccc".as_slice()]
        );
    }

    #[test]
    fn test_layout_is_little_endian() {
        let batch = encode_batch([vec![0xAA; 258]]).unwrap();
        assert_eq!(&batch[..4], &[2, 1, 0, 0]);
        assert_eq!(batch.len(), 262);
    }

    #[test]
    fn test_trailing_partial_header_is_ignored() {
        let mut batch = encode_batch(["a", "bb", "ccc"]).unwrap();
        batch.extend_from_slice(&[9, 0, 0]);

        let entries: Vec<&[u8]> = decode_batch(&batch).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2], b"ccc");
    }

    #[test]
    fn test_truncated_body_is_discarded() {
        let mut batch = encode_batch(["ok"]).unwrap();
        batch.extend_from_slice(&10u32.to_le_bytes());
        batch.extend_from_slice(b"short");

        let entries: Vec<&[u8]> = decode_batch(&batch).collect();
        assert_eq!(entries, vec![b"ok".as_slice()]);
    }

    #[test]
    fn test_entry_prefix_bounds() {
        assert_eq!(entry_prefix(0).unwrap(), [0, 0, 0, 0]);
        assert_eq!(entry_prefix(u32::MAX as usize).unwrap(), [0xFF; 4]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_entry_is_rejected() {
        let len = u32::MAX as usize + 1;
        match entry_prefix(len) {
            Err(Error::BatchEntryTooLong { len: rejected }) => assert_eq!(rejected, len),
            other => panic!("expected oversized entry error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        assert_eq!(decode_batch(&[]).count(), 0);
    }

    #[test]
    fn test_zero_length_entry() {
        let batch = encode_batch([""]).unwrap();
        assert_eq!(batch, vec![0, 0, 0, 0]);
        let entries: Vec<&[u8]> = decode_batch(&batch).collect();
        assert_eq!(entries, vec![b"".as_slice()]);
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let total: usize = decode_batch(&bytes).map(|e| e.len() + LENGTH_PREFIX_LEN).sum();
            prop_assert!(total <= bytes.len());
        }

        #[test]
        fn prop_round_trip(messages in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64), 0..16)
        ) {
            let batch = encode_batch(&messages).unwrap();
            let decoded: Vec<Vec<u8>> = decode_batch(&batch).map(<[u8]>::to_vec).collect();
            prop_assert_eq!(decoded, messages);
        }
    }
}

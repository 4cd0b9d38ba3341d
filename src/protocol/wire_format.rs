//! Wire format encoding and decoding.
//!
//! Every value on the wire is a frame:
//! ```text
//! ┌──────────────────┬──────────────────────┐
//! │ Length           │ Payload              │
//! │ 8 bytes          │ `Length` raw bytes   │
//! │ uint64 BE        │                      │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! The payload is opaque; no escaping is needed since the length is explicit.

use crate::error::{RpcError, Result};

/// Length prefix size in bytes (fixed, exactly 8).
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Encode a payload length to bytes (Big Endian).
///
/// # Example
///
/// ```
/// use wirecall::protocol::encode_length;
///
/// assert_eq!(encode_length(258), [0, 0, 0, 0, 0, 0, 1, 2]);
/// ```
#[inline]
pub fn encode_length(length: u64) -> [u8; LENGTH_PREFIX_SIZE] {
    length.to_be_bytes()
}

/// Decode a payload length from bytes (Big Endian).
///
/// Returns `None` if buffer is too short.
///
/// # Example
///
/// ```
/// use wirecall::protocol::decode_length;
///
/// assert_eq!(decode_length(&[0, 0, 0, 0, 0, 0, 0, 42]), Some(42));
/// assert_eq!(decode_length(&[0, 0, 0]), None);
/// ```
#[inline]
pub fn decode_length(buf: &[u8]) -> Option<u64> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = buf.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    Some(u64::from_be_bytes(prefix))
}

/// Check a declared length against an optional maximum.
///
/// `None` trusts the peer, which is the protocol default.
pub fn validate_length(length: u64, max_payload_size: Option<u64>) -> Result<()> {
    match max_payload_size {
        Some(max) if length > max => Err(RpcError::FrameTooLarge { length, max }),
        _ => Ok(()),
    }
}

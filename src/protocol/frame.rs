//! Frame struct with typed accessors.
//!
//! Represents one length-prefixed unit on the wire.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use wirecall::protocol::Frame;
//!
//! let frame = Frame::from_static(b"hello");
//! assert_eq!(frame.length(), 5);
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{encode_length, LENGTH_PREFIX_SIZE};

/// A complete protocol frame.
///
/// The length is always derived from the payload, so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from a payload.
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Create a frame from raw bytes (copies data).
    pub fn from_slice(payload: &[u8]) -> Self {
        Self {
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Create a frame over static bytes (no copy).
    pub fn from_static(payload: &'static [u8]) -> Self {
        Self {
            payload: Bytes::from_static(payload),
        }
    }

    /// Create an empty frame.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Value written in the length prefix.
    #[inline]
    pub fn length(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Check if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as UTF-8 text, if valid.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Consume the frame, returning its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Encode the whole frame (prefix + payload) into one buffer.
    pub fn encode(&self) -> Vec<u8> {
        build_frame(&self.payload)
    }
}

impl From<Bytes> for Frame {
    fn from(payload: Bytes) -> Self {
        Self::new(payload)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(Bytes::from(payload))
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::from_slice(text.as_bytes())
    }
}

/// Build a complete frame as a single byte vector.
///
/// Encodes the length prefix and appends the payload into a contiguous
/// buffer so it can be sent with one write.
///
/// # Example
///
/// ```
/// use wirecall::protocol::build_frame;
///
/// let bytes = build_frame(b"hello");
/// assert_eq!(bytes.len(), 8 + 5); // prefix + payload
/// ```
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&encode_length(payload.len() as u64));
    buf.extend_from_slice(payload);
    buf
}

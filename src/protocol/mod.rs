//! Protocol module - wire format, framing, and frame I/O.
//!
//! This module implements the two wire encodings:
//! - **Framed** (default): 8-byte big-endian length prefix + raw payload
//! - **Line** (legacy): newline-terminated text requests with `|`-separated
//!   arguments

mod frame;
mod line;
mod stream;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use line::{
    format_request_line, parse_request_line, read_line, write_line, LineRequest, ARG_SEPARATOR,
    LINE_VERB,
};
pub use stream::{read_frame, read_required_frame, write_frame};
pub use wire_format::{decode_length, encode_length, validate_length, LENGTH_PREFIX_SIZE};

/// Wire encoding spoken on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Length-prefixed frames; one name frame plus one frame per argument.
    #[default]
    Framed,
    /// Legacy newline-delimited text.
    Line,
}

//! Error types for wirecall.
//!
//! Errors fall into two classes:
//! - **framing-level**: the byte stream itself is broken (truncated frame,
//!   oversized length, I/O failure). The connection is closed.
//! - **request-level**: everything else. The error is turned into an
//!   `{"error": "..."}` response and the connection keeps serving.

use thiserror::Error;

/// Main error type for all wirecall operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Peer closed the stream in the middle of a frame.
    #[error("Short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: u64, received: u64 },

    /// Connection closed before a response arrived.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Declared frame length exceeds the configured maximum.
    #[error("Frame size {length} exceeds maximum {max}")]
    FrameTooLarge { length: u64, max: u64 },

    /// No data arrived within the configured idle deadline.
    #[error("Connection idle for longer than {0:?}")]
    Timeout(std::time::Duration),

    /// Procedure name absent from the registry.
    #[error("Function Not Found")]
    ProcedureNotFound(String),

    /// Argument count does not match the procedure's parameter count.
    #[error("incorrect number of arguments for {procedure}: expected {expected}, got {received}")]
    Arity {
        procedure: String,
        expected: usize,
        received: usize,
    },

    /// A token could not be coerced to its declared kind.
    #[error("invalid argument at position {position}: {token:?} ({reason})")]
    Argument {
        position: usize,
        token: String,
        reason: String,
    },

    /// The procedure declares a parameter kind the coercion engine cannot produce.
    #[error("unsupported argument type at position {position} for procedure {procedure}")]
    UnsupportedType { position: usize, procedure: String },

    /// The callable reported failure (or panicked).
    #[error("invocation failed: {0}")]
    Invocation(String),

    /// The result cannot be expressed in the response grammar.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Malformed legacy line request.
    #[error("Bad Request")]
    BadRequest,

    /// Protocol error (invalid response payload, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with an error record.
    #[error("Remote error: {0}")]
    Remote(String),
}

impl RpcError {
    /// Whether this error leaves the byte stream in an unknown state.
    ///
    /// Framing-level errors terminate the connection; all others are
    /// answered with an error record.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            RpcError::Io(_)
                | RpcError::ShortRead { .. }
                | RpcError::FrameTooLarge { .. }
                | RpcError::Timeout(_)
                | RpcError::ConnectionClosed
        )
    }

    /// Render the single-key `{"error": "..."}` response record.
    pub fn to_response(&self) -> Vec<u8> {
        let record = serde_json::json!({ "error": self.to_string() });
        // Serializing a map with one string value cannot fail.
        serde_json::to_vec(&record).unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec())
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_record_matches_legacy_text() {
        let err = RpcError::ProcedureNotFound("missing".to_string());
        assert_eq!(err.to_response(), br#"{"error":"Function Not Found"}"#);
    }

    #[test]
    fn test_framing_classification() {
        assert!(RpcError::ShortRead {
            expected: 8,
            received: 3
        }
        .is_framing());
        assert!(RpcError::FrameTooLarge { length: 10, max: 5 }.is_framing());
        assert!(!RpcError::BadRequest.is_framing());
        assert!(!RpcError::Invocation("boom".into()).is_framing());
        assert!(!RpcError::ProcedureNotFound("x".into()).is_framing());
    }

    #[test]
    fn test_error_record_escapes_message() {
        let err = RpcError::Argument {
            position: 0,
            token: "a\"b".to_string(),
            reason: "invalid digit".to_string(),
        };
        let record: serde_json::Value = serde_json::from_slice(&err.to_response()).unwrap();
        let message = record["error"].as_str().unwrap();
        assert!(message.contains("position 0"));
        assert!(message.contains("a\\\"b"));
    }
}

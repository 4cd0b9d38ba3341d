//! Legacy line protocol.
//!
//! ```text
//! CALL add 5|3\n      ->  8\n
//! CALL ping\n         ->  pong\n
//! ```
//!
//! The first token is a verb and is ignored. Arguments are separated by `|`.
//! Neither arguments nor responses can contain a newline, and arguments cannot
//! contain `|`; use the framed protocol for arbitrary payloads.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{RpcError, Result};

/// Verb written by clients in front of the procedure name.
pub const LINE_VERB: &str = "CALL";

/// Separator between arguments.
pub const ARG_SEPARATOR: char = '|';

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    /// Procedure name.
    pub procedure: String,
    /// Raw argument tokens, in order.
    pub args: Vec<String>,
}

/// Parse one request line (without its terminating newline).
///
/// # Example
///
/// ```
/// use wirecall::protocol::parse_request_line;
///
/// let req = parse_request_line("CALL add 5|3").unwrap();
/// assert_eq!(req.procedure, "add");
/// assert_eq!(req.args, vec!["5", "3"]);
/// ```
pub fn parse_request_line(line: &str) -> Result<LineRequest> {
    let mut parts = line.trim().splitn(3, ' ');
    let _verb = parts.next();
    let procedure = parts.next().ok_or(RpcError::BadRequest)?;

    let args = match parts.next() {
        None | Some("") => Vec::new(),
        Some(args) => args.split(ARG_SEPARATOR).map(str::to_string).collect(),
    };

    Ok(LineRequest {
        procedure: procedure.to_string(),
        args,
    })
}

/// Format a request line, newline included.
pub fn format_request_line(procedure: &str, args: &[&str]) -> String {
    if args.is_empty() {
        format!("{} {}\n", LINE_VERB, procedure)
    } else {
        format!("{} {} {}\n", LINE_VERB, procedure, args.join("|"))
    }
}

/// Read one newline-terminated line, without the newline.
///
/// Returns `Ok(None)` on a clean close between lines. A final line that is not
/// newline-terminated is a `ShortRead`.
pub async fn read_line<R>(reader: &mut R, max_line_size: Option<u64>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = match max_line_size {
        // One extra byte distinguishes "exactly max" from "too long".
        Some(max) => {
            (&mut *reader)
                .take(max.saturating_add(1))
                .read_until(b'\n', &mut buf)
                .await?
        }
        None => reader.read_until(b'\n', &mut buf).await?,
    };

    if read == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') {
        if let Some(max) = max_line_size {
            if buf.len() as u64 > max {
                return Err(RpcError::FrameTooLarge {
                    length: buf.len() as u64,
                    max,
                });
            }
        }
        return Err(RpcError::ShortRead {
            expected: buf.len() as u64 + 1,
            received: buf.len() as u64,
        });
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Write one response line and flush it.
pub async fn write_line<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.extend_from_slice(payload);
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

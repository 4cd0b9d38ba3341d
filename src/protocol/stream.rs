//! Reading and writing frames on an async byte stream.
//!
//! Reads never buffer past the frame being decoded, so a dispatcher can stop
//! after any frame without losing bytes that belong to the next request.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::frame::{build_frame, Frame};
use super::wire_format::{validate_length, LENGTH_PREFIX_SIZE};
use crate::error::{RpcError, Result};

/// Upper bound on the buffer reserved before any payload byte arrives.
const INITIAL_PAYLOAD_CAPACITY: u64 = 64 * 1024;

/// Read one frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly on a frame
/// boundary. A stream that ends inside the length prefix or the payload is a
/// `ShortRead`.
pub async fn read_frame<R>(reader: &mut R, max_payload_size: Option<u64>) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let filled = read_full(reader, &mut prefix).await?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < LENGTH_PREFIX_SIZE {
        return Err(RpcError::ShortRead {
            expected: LENGTH_PREFIX_SIZE as u64,
            received: filled as u64,
        });
    }

    let length = u64::from_be_bytes(prefix);
    validate_length(length, max_payload_size)?;

    // Grow with the data instead of trusting `length` for one allocation.
    let mut payload = Vec::with_capacity(length.min(INITIAL_PAYLOAD_CAPACITY) as usize);
    let received = (&mut *reader).take(length).read_to_end(&mut payload).await? as u64;
    if received < length {
        return Err(RpcError::ShortRead {
            expected: length,
            received,
        });
    }

    Ok(Some(Frame::from(payload)))
}

/// Read one frame that must be present (e.g. an argument of a request
/// already in progress). A clean close here is still a `ShortRead`.
pub async fn read_required_frame<R>(reader: &mut R, max_payload_size: Option<u64>) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader, max_payload_size)
        .await?
        .ok_or(RpcError::ShortRead {
            expected: LENGTH_PREFIX_SIZE as u64,
            received: 0,
        })
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&build_frame(payload)).await?;
    writer.flush().await?;
    Ok(())
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

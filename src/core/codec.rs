//! EPC framing: six hex digits of payload length, then the UTF-8 payload.

use crate::domain::model::Value;
use crate::utils::error::{Result, ServerError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const HEADER_LEN: usize = 6;
pub const MAX_PAYLOAD_LEN: usize = 0xFF_FFFF;

/// Frames a payload; the trailing newline is part of the counted length.
pub fn encode_frame(payload: &str) -> Result<Vec<u8>> {
    let len = payload.len() + 1;
    if len > MAX_PAYLOAD_LEN {
        return Err(ServerError::frame(format!(
            "payload of {len} bytes exceeds the {MAX_PAYLOAD_LEN} byte limit"
        )));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + len);
    frame.extend_from_slice(format!("{len:06x}").as_bytes());
    frame.extend_from_slice(payload.as_bytes());
    frame.push(b'\n');
    Ok(frame)
}

pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    encode_frame(&value.to_string())
}

fn parse_header(header: &[u8; HEADER_LEN]) -> Result<usize> {
    if !header.iter().all(u8::is_ascii_hexdigit) {
        return Err(ServerError::frame(format!(
            "invalid length header {:?}",
            String::from_utf8_lossy(header)
        )));
    }
    let text = std::str::from_utf8(header).map_err(|e| ServerError::frame(e.to_string()))?;
    usize::from_str_radix(text, 16).map_err(|e| ServerError::frame(e.to_string()))
}

/// Reads one frame. `Ok(None)` means the peer closed between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ServerError::frame("connection closed inside a frame header"));
        }
        filled += n;
    }

    let len = parse_header(&header)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ServerError::frame(format!("connection closed inside a {len} byte payload"))
        } else {
            ServerError::IoError(e)
        }
    })?;

    String::from_utf8(payload)
        .map(Some)
        .map_err(|e| ServerError::frame(format!("payload is not UTF-8: {e}")))
}

pub async fn write_value<W>(writer: &mut W, value: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_value(value)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

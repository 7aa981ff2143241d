use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};

/// Frame header: a bare 2-byte little-endian payload length.
pub const LEN_PREFIX_SIZE: usize = 2;

/// Largest payload the length prefix can describe.
pub const MAX_OUTBOUND_PAYLOAD: usize = u16::MAX as usize;

/// Inbound lengths above this are treated as corruption.
pub const DEFAULT_MAX_INBOUND: usize = 4096;

/// Default gateway UART speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length (2B)  │ Payload          │
/// │ LE, excl.    │ (Length bytes)   │
/// │ itself       │                  │
/// └──────────────┴──────────────────┘
/// ```
///
/// There is no magic and no checksum; both ends rely on agreeing on offsets.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_OUTBOUND_PAYLOAD {
        return Err(TransportError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_OUTBOUND_PAYLOAD,
        });
    }
    dst.reserve(LEN_PREFIX_SIZE + payload.len());
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one payload from a buffer.
///
/// Returns `None` if the buffer doesn't contain a complete frame yet. A length
/// of zero or above `max_payload` is discarded (two bytes consumed) and
/// decoding resumes at the next two bytes. On success, consumes the frame
/// bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Option<Bytes> {
    loop {
        if src.len() < LEN_PREFIX_SIZE {
            return None;
        }

        let len = u16::from_le_bytes([src[0], src[1]]) as usize;
        if len == 0 || len > max_payload {
            debug!(len, max = max_payload, "discarding corrupt frame length");
            src.advance(LEN_PREFIX_SIZE);
            continue;
        }

        let total = LEN_PREFIX_SIZE + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return None;
        }

        src.advance(LEN_PREFIX_SIZE);
        return Some(src.split_to(len).freeze());
    }
}

/// Configuration for the gateway link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// UART speed when the link is a serial port.
    pub baud_rate: u32,
    /// How long a single blocking read may wait before the reader re-checks
    /// its stop flag.
    pub read_timeout: Duration,
    /// How long `close` waits for the reader thread before releasing the link.
    pub close_grace: Duration,
    /// Largest inbound payload accepted by the reader.
    pub max_inbound_len: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            close_grace: Duration::from_secs(2),
            max_inbound_len: DEFAULT_MAX_INBOUND,
        }
    }
}

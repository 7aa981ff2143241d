use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ensure_len, Result};
use crate::header::{Header, PacketType, HEADER_SIZE};

/// Header + capabilities (2B LE).
pub const HELLO_SIZE: usize = HEADER_SIZE + 2;

/// Announcement sent by a node when it boots or enters pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hello {
    pub header: Header,
    /// Capability bitmask advertised by the node firmware.
    pub capabilities: u16,
}

impl Hello {
    pub fn new(node_id: u8, capabilities: u16) -> Self {
        Self {
            header: Header::new(PacketType::Hello, node_id),
            capabilities,
        }
    }

    pub fn decode(src: &[u8]) -> Result<Self> {
        ensure_len("hello", HELLO_SIZE, src)?;
        let mut buf = src;
        let header = Header::read_from(&mut buf);
        Ok(Self {
            header,
            capabilities: buf.get_u16_le(),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HELLO_SIZE);
        self.header.encode(dst);
        dst.put_u16_le(self.capabilities);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(HELLO_SIZE);
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Decode a HELLO packet. Requires at least [`HELLO_SIZE`] bytes.
pub fn decode_hello(src: &[u8]) -> Result<Hello> {
    Hello::decode(src)
}

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ensure_len, Result};
use crate::header::{Header, PacketType, HEADER_SIZE};

/// Header + status (1B).
pub const CONFIG_ACK_SIZE: usize = HEADER_SIZE + 1;

/// Node acknowledgement of an applied configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigAck {
    pub header: Header,
    pub status: u8,
}

impl ConfigAck {
    pub fn new(node_id: u8, status: u8) -> Self {
        Self {
            header: Header::new(PacketType::ConfigAck, node_id),
            status,
        }
    }

    pub fn decode(src: &[u8]) -> Result<Self> {
        ensure_len("config ack", CONFIG_ACK_SIZE, src)?;
        let mut buf = src;
        let header = Header::read_from(&mut buf);
        Ok(Self {
            header,
            status: buf.get_u8(),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(CONFIG_ACK_SIZE);
        self.header.encode(dst);
        dst.put_u8(self.status);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(CONFIG_ACK_SIZE);
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Decode a CONFIG_ACK packet. Requires at least [`CONFIG_ACK_SIZE`] bytes.
pub fn decode_config_ack(src: &[u8]) -> Result<ConfigAck> {
    ConfigAck::decode(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;

    #[test]
    fn decode_ack() {
        let ack = decode_config_ack(&[0x05, 0x09, 0x00, 0x01, 0x01, 0x00]).unwrap();
        assert_eq!(ack.header.pkt_type, PacketType::ConfigAck);
        assert_eq!(ack.header.node_id, 9);
        assert_eq!(ack.status, 0);
    }

    #[test]
    fn encode_matches_layout() {
        let ack = ConfigAck::new(3, 0x02);
        assert_eq!(ack.to_bytes().as_ref(), &[0x05, 3, 0x00, 0x01, 0x01, 0x02]);
    }

    #[test]
    fn short_ack_rejected() {
        let bytes = ConfigAck::new(9, 0).to_bytes();
        for len in 0..CONFIG_ACK_SIZE {
            let err = decode_config_ack(&bytes[..len]).unwrap_err();
            assert_eq!(
                err,
                PacketError::ShortBuffer {
                    kind: "config ack",
                    required: CONFIG_ACK_SIZE,
                    actual: len,
                }
            );
        }
    }
}

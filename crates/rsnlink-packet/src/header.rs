use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ensure_len, Result};

/// Common header: type (1) + node id (1) + mode (1) + hw (1) + fw (1) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Default hardware revision stamped on host-built packets.
pub const DEFAULT_HW_VERSION: u8 = 1;

/// Default firmware revision stamped on host-built packets.
pub const DEFAULT_FW_VERSION: u8 = 1;

/// Inner packet kind carried in the first header byte.
///
/// Values outside the known set are kept as `Other` so they survive a
/// decode/encode cycle unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    Hello,
    Handshake,
    Telemetry,
    Config,
    ConfigAck,
    Debug,
    Other(u8),
}

impl PacketType {
    /// Human-readable name for logs and tables.
    pub fn name(self) -> &'static str {
        match self {
            PacketType::Hello => "HELLO",
            PacketType::Handshake => "HANDSHAKE",
            PacketType::Telemetry => "TELEMETRY",
            PacketType::Config => "CONFIG",
            PacketType::ConfigAck => "CONFIG_ACK",
            PacketType::Debug => "DEBUG",
            PacketType::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => PacketType::Hello,
            0x02 => PacketType::Handshake,
            0x03 => PacketType::Telemetry,
            0x04 => PacketType::Config,
            0x05 => PacketType::ConfigAck,
            0x06 => PacketType::Debug,
            other => PacketType::Other(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        match value {
            PacketType::Hello => 0x01,
            PacketType::Handshake => 0x02,
            PacketType::Telemetry => 0x03,
            PacketType::Config => 0x04,
            PacketType::ConfigAck => 0x05,
            PacketType::Debug => 0x06,
            PacketType::Other(raw) => raw,
        }
    }
}

/// Operating mode reported by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Running,
    Pairing,
    Debug,
    Other(u8),
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Running => "RUNNING",
            Mode::Pairing => "PAIRING",
            Mode::Debug => "DEBUG",
            Mode::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for Mode {
    fn from(value: u8) -> Self {
        match value {
            0 => Mode::Running,
            1 => Mode::Pairing,
            2 => Mode::Debug,
            other => Mode::Other(other),
        }
    }
}

impl From<Mode> for u8 {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Running => 0,
            Mode::Pairing => 1,
            Mode::Debug => 2,
            Mode::Other(raw) => raw,
        }
    }
}

/// Header shared by every node packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub pkt_type: PacketType,
    pub node_id: u8,
    pub mode: Mode,
    pub hw_version: u8,
    pub fw_version: u8,
}

impl Header {
    /// Create a header in `RUNNING` mode with the default hw/fw revisions.
    pub fn new(pkt_type: PacketType, node_id: u8) -> Self {
        Self {
            pkt_type,
            node_id,
            mode: Mode::Running,
            hw_version: DEFAULT_HW_VERSION,
            fw_version: DEFAULT_FW_VERSION,
        }
    }

    /// Decode a header from the start of `src`.
    pub fn decode(src: &[u8]) -> Result<Self> {
        ensure_len("header", HEADER_SIZE, src)?;
        let mut buf = src;
        Ok(Self::read_from(&mut buf))
    }

    /// Append the 5-byte header to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u8(self.pkt_type.into());
        dst.put_u8(self.node_id);
        dst.put_u8(self.mode.into());
        dst.put_u8(self.hw_version);
        dst.put_u8(self.fw_version);
    }

    /// Encode the header on its own.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(HEADER_SIZE);
        self.encode(&mut dst);
        dst.freeze()
    }

    // Callers must have checked that `buf` holds HEADER_SIZE bytes.
    pub(crate) fn read_from(buf: &mut &[u8]) -> Self {
        Self {
            pkt_type: PacketType::from(buf.get_u8()),
            node_id: buf.get_u8(),
            mode: Mode::from(buf.get_u8()),
            hw_version: buf.get_u8(),
            fw_version: buf.get_u8(),
        }
    }
}

/// Decode a packet header. Requires at least [`HEADER_SIZE`] bytes.
pub fn decode_header(src: &[u8]) -> Result<Header> {
    Header::decode(src)
}

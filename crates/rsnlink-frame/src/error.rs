use rsnlink_packet::PacketError;

/// Errors that can occur while parsing gateway frame payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The payload contained no bytes at all.
    #[error("empty payload")]
    EmptyPayload,

    /// The leading tag is not a known uplink frame type.
    #[error("unknown frame type 0x{0:02X}")]
    UnknownFrameType(u8),

    /// The payload is shorter than the fixed size of its frame type.
    #[error("{kind} frame too short ({actual} bytes, need {expected})")]
    ShortFrame {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The embedded node packet could not be decoded.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
}

impl FrameError {
    /// Returns true when the frame came from a newer gateway protocol revision.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, FrameError::UnknownFrameType(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

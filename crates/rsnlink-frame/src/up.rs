use bytes::{Buf, BufMut, Bytes, BytesMut};
use rsnlink_packet::{
    ConfigAck, Hello, Telemetry, CONFIG_ACK_SIZE, HELLO_SIZE, TELEMETRY_SIZE,
};

use crate::error::{FrameError, Result};
use crate::tag::{tag_name, UP_CONFIG_ACK, UP_HELLO, UP_TELEMETRY};

/// Tag (1) + node id (1) + rssi (1).
pub const UP_PREFIX_SIZE: usize = 3;

/// Gateway-local timestamp carried by telemetry frames (4B LE).
pub const GATEWAY_TS_SIZE: usize = 4;

pub const UP_HELLO_FRAME_SIZE: usize = UP_PREFIX_SIZE + HELLO_SIZE;
pub const UP_TELEMETRY_FRAME_SIZE: usize = UP_PREFIX_SIZE + GATEWAY_TS_SIZE + TELEMETRY_SIZE;
pub const UP_CONFIG_ACK_FRAME_SIZE: usize = UP_PREFIX_SIZE + CONFIG_ACK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloFrame {
    pub node_id: u8,
    /// Link quality measured by the gateway for this frame.
    pub rssi: i8,
    pub hello: Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame {
    pub node_id: u8,
    pub rssi: i8,
    /// Gateway clock when the packet was received.
    pub local_ts_ms: u32,
    pub telemetry: Telemetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigAckFrame {
    pub node_id: u8,
    pub rssi: i8,
    pub ack: ConfigAck,
}

/// A decoded uplink payload.
///
/// The outer `node_id` is the routing identity. The inner packet header also
/// carries a node id and type; they are not cross-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpFrame {
    Hello(HelloFrame),
    Telemetry(TelemetryFrame),
    ConfigAck(ConfigAckFrame),
}

impl UpFrame {
    /// Outer frame tag for this variant.
    pub fn tag(&self) -> u8 {
        match self {
            UpFrame::Hello(_) => UP_HELLO,
            UpFrame::Telemetry(_) => UP_TELEMETRY,
            UpFrame::ConfigAck(_) => UP_CONFIG_ACK,
        }
    }

    pub fn node_id(&self) -> u8 {
        match self {
            UpFrame::Hello(f) => f.node_id,
            UpFrame::Telemetry(f) => f.node_id,
            UpFrame::ConfigAck(f) => f.node_id,
        }
    }

    pub fn rssi(&self) -> i8 {
        match self {
            UpFrame::Hello(f) => f.rssi,
            UpFrame::Telemetry(f) => f.rssi,
            UpFrame::ConfigAck(f) => f.rssi,
        }
    }

    /// Header of the embedded node packet.
    pub fn inner_header(&self) -> &rsnlink_packet::Header {
        match self {
            UpFrame::Hello(f) => &f.hello.header,
            UpFrame::Telemetry(f) => &f.telemetry.header,
            UpFrame::ConfigAck(f) => &f.ack.header,
        }
    }

    /// Serialize back to an uplink payload, as the gateway would send it.
    pub fn to_payload(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(UP_TELEMETRY_FRAME_SIZE);
        dst.put_u8(self.tag());
        dst.put_u8(self.node_id());
        dst.put_i8(self.rssi());
        match self {
            UpFrame::Hello(f) => f.hello.encode(&mut dst),
            UpFrame::Telemetry(f) => {
                dst.put_u32_le(f.local_ts_ms);
                f.telemetry.encode(&mut dst);
            }
            UpFrame::ConfigAck(f) => f.ack.encode(&mut dst),
        }
        dst.freeze()
    }
}

/// Parse an uplink payload into a typed frame.
///
/// Byte 0 selects the frame type. Bytes beyond the fixed size of the frame
/// are ignored.
pub fn parse_up_payload(payload: &[u8]) -> Result<UpFrame> {
    let Some(&tag) = payload.first() else {
        return Err(FrameError::EmptyPayload);
    };
    tracing::trace!(tag = tag_name(tag), len = payload.len(), "parsing uplink payload");

    match tag {
        UP_HELLO => {
            ensure_frame_len(tag, UP_HELLO_FRAME_SIZE, payload)?;
            let (node_id, rssi, body) = split_prefix(payload);
            Ok(UpFrame::Hello(HelloFrame {
                node_id,
                rssi,
                hello: Hello::decode(body)?,
            }))
        }
        UP_TELEMETRY => {
            ensure_frame_len(tag, UP_TELEMETRY_FRAME_SIZE, payload)?;
            let (node_id, rssi, mut body) = split_prefix(payload);
            let local_ts_ms = body.get_u32_le();
            Ok(UpFrame::Telemetry(TelemetryFrame {
                node_id,
                rssi,
                local_ts_ms,
                telemetry: Telemetry::decode(body)?,
            }))
        }
        UP_CONFIG_ACK => {
            ensure_frame_len(tag, UP_CONFIG_ACK_FRAME_SIZE, payload)?;
            let (node_id, rssi, body) = split_prefix(payload);
            Ok(UpFrame::ConfigAck(ConfigAckFrame {
                node_id,
                rssi,
                ack: ConfigAck::decode(body)?,
            }))
        }
        other => Err(FrameError::UnknownFrameType(other)),
    }
}

fn ensure_frame_len(tag: u8, expected: usize, payload: &[u8]) -> Result<()> {
    if payload.len() < expected {
        return Err(FrameError::ShortFrame {
            kind: tag_name(tag),
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

// Length already checked against UP_PREFIX_SIZE by the caller.
fn split_prefix(payload: &[u8]) -> (u8, i8, &[u8]) {
    let node_id = payload[1];
    let rssi = payload[2] as i8;
    (node_id, rssi, &payload[UP_PREFIX_SIZE..])
}

#[cfg(test)]
mod tests {
    use rsnlink_packet::{BatteryStatus, ChannelStats, Mode, PacketType};

    use super::*;

    fn hello_payload() -> Vec<u8> {
        let rssi = (-42i8) as u8;
        vec![0xA1, 0x05, rssi, 0x01, 0x05, 0x01, 0x01, 0x01, 0x03, 0x00]
    }

    #[test]
    fn parse_hello_frame() {
        let frame = parse_up_payload(&hello_payload()).unwrap();
        let UpFrame::Hello(hello) = frame else {
            panic!("expected hello frame, got {frame:?}");
        };
        assert_eq!(hello.node_id, 5);
        assert_eq!(hello.rssi, -42);
        assert_eq!(hello.hello.capabilities, 3);
        assert_eq!(hello.hello.header.mode, Mode::Pairing);
    }

    #[test]
    fn parse_telemetry_frame() {
        let telemetry = Telemetry {
            batt_status: BatteryStatus::Low,
            soil: ChannelStats {
                mean: 812,
                median: 810,
                min: 790,
                max: 840,
                std: 12,
            },
            last_rssi: -70,
            ..Telemetry::new(9, 17, 60_000)
        };
        let source = UpFrame::Telemetry(TelemetryFrame {
            node_id: 9,
            rssi: -101,
            local_ts_ms: 0xDEAD_BEEF,
            telemetry,
        });
        let payload = source.to_payload();
        assert_eq!(payload.len(), UP_TELEMETRY_FRAME_SIZE);
        assert_eq!(&payload[3..7], &[0xEF, 0xBE, 0xAD, 0xDE]);

        let parsed = parse_up_payload(&payload).unwrap();
        assert_eq!(parsed, source);
        assert_eq!(parsed.rssi(), -101);
        assert_eq!(parsed.inner_header().pkt_type, PacketType::Telemetry);
    }

    #[test]
    fn parse_config_ack_frame() {
        let payload = [0xA3, 0x02, 0xC8, 0x05, 0x02, 0x00, 0x01, 0x01, 0x00];
        let frame = parse_up_payload(&payload).unwrap();
        assert_eq!(frame.tag(), UP_CONFIG_ACK);
        assert_eq!(frame.node_id(), 2);
        assert_eq!(frame.rssi(), -56);
        let UpFrame::ConfigAck(ack) = frame else {
            panic!("expected config ack frame");
        };
        assert_eq!(ack.ack.status, 0);
    }

    #[test]
    fn empty_payload_rejected() {
        assert_eq!(parse_up_payload(&[]), Err(FrameError::EmptyPayload));
    }

    #[test]
    fn unknown_tags_rejected() {
        for tag in (0u8..=255).filter(|t| ![UP_HELLO, UP_TELEMETRY, UP_CONFIG_ACK].contains(t)) {
            let err = parse_up_payload(&[tag, 0x01, 0x02, 0x03]).unwrap_err();
            assert_eq!(err, FrameError::UnknownFrameType(tag));
            assert!(err.is_unknown_type());
        }
    }

    #[test]
    fn downlink_tag_is_not_an_uplink_frame() {
        let err = parse_up_payload(&[0xB1, 0x07]).unwrap_err();
        assert_eq!(err, FrameError::UnknownFrameType(0xB1));
    }

    #[test]
    fn truncated_frames_report_expected_length() {
        let payload = hello_payload();
        for len in 1..payload.len() {
            let err = parse_up_payload(&payload[..len]).unwrap_err();
            assert_eq!(
                err,
                FrameError::ShortFrame {
                    kind: "UP_HELLO",
                    expected: UP_HELLO_FRAME_SIZE,
                    actual: len,
                }
            );
        }

        let err = parse_up_payload(&[UP_TELEMETRY; UP_TELEMETRY_FRAME_SIZE - 1]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortFrame {
                expected: UP_TELEMETRY_FRAME_SIZE,
                ..
            }
        ));

        let err = parse_up_payload(&[UP_CONFIG_ACK, 0x01, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortFrame {
                expected: UP_CONFIG_ACK_FRAME_SIZE,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn outer_fields_are_trusted_over_inner_header() {
        // Outer node 5, inner header claims node 99 and a CONFIG type.
        let payload = [0xA1, 0x05, 0x00, 0x04, 99, 0x00, 0x01, 0x01, 0x00, 0x00];
        let frame = parse_up_payload(&payload).unwrap();
        assert_eq!(frame.node_id(), 5);
        assert_eq!(frame.inner_header().node_id, 99);
        assert_eq!(frame.inner_header().pkt_type, PacketType::Config);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut payload = hello_payload();
        payload.extend_from_slice(&[0xFF; 8]);
        assert!(matches!(parse_up_payload(&payload), Ok(UpFrame::Hello(_))));
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(UP_HELLO_FRAME_SIZE, 10);
        assert_eq!(UP_TELEMETRY_FRAME_SIZE, 53);
        assert_eq!(UP_CONFIG_ACK_FRAME_SIZE, 9);
    }
}

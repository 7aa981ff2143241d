use bytes::{BufMut, Bytes, BytesMut};
use rsnlink_packet::{Config, Header, Mode, PacketType, CONFIG_SIZE, HEADER_SIZE};

use crate::tag::{DOWN_CONFIG, DOWN_HANDSHAKE};

/// Tag (1) + node id (1).
pub const DOWN_PREFIX_SIZE: usize = 2;

pub const DOWN_CONFIG_FRAME_SIZE: usize = DOWN_PREFIX_SIZE + CONFIG_SIZE;
pub const DOWN_HANDSHAKE_FRAME_SIZE: usize = DOWN_PREFIX_SIZE + HEADER_SIZE;

/// Build a DOWN_CONFIG payload: `[0xB1][node_id][config record]`.
///
/// The config record is encoded as-is; the gateway rewrites its header
/// before forwarding. No size limit is applied here.
pub fn build_down_config_payload(node_id: u8, config: &Config) -> Bytes {
    let mut dst = BytesMut::with_capacity(DOWN_CONFIG_FRAME_SIZE);
    dst.put_u8(DOWN_CONFIG);
    dst.put_u8(node_id);
    config.encode(&mut dst);
    dst.freeze()
}

/// Build a DOWN_HANDSHAKE payload: `[0xB2][node_id][HANDSHAKE header]`.
pub fn build_down_handshake_payload(node_id: u8, hw_version: u8, fw_version: u8) -> Bytes {
    let header = Header {
        pkt_type: PacketType::Handshake,
        node_id,
        mode: Mode::Running,
        hw_version,
        fw_version,
    };
    let mut dst = BytesMut::with_capacity(DOWN_HANDSHAKE_FRAME_SIZE);
    dst.put_u8(DOWN_HANDSHAKE);
    dst.put_u8(node_id);
    header.encode(&mut dst);
    dst.freeze()
}

/// [`build_down_handshake_payload`] with hw/fw revision 1.
pub fn build_default_handshake_payload(node_id: u8) -> Bytes {
    build_down_handshake_payload(
        node_id,
        rsnlink_packet::DEFAULT_HW_VERSION,
        rsnlink_packet::DEFAULT_FW_VERSION,
    )
}

#[cfg(test)]
mod tests {
    use rsnlink_packet::decode_config;

    use super::*;

    #[test]
    fn config_payload_prefixes_tag_and_node() {
        let cfg = Config {
            sleep_time_s: 300,
            pwr_up_time_ms: 100,
            settling_time_ms: 150,
            sampling_interval_ms: 50,
            led_mode_default: 0,
            batt_bucket: 1,
            lost_rx_limit: 3,
            debug_mode: 0,
            reset_flags: 0,
            ..Config::for_node(7)
        };
        let payload = build_down_config_payload(7, &cfg);

        assert_eq!(payload.len(), DOWN_CONFIG_FRAME_SIZE);
        assert_eq!(payload.len(), 20);
        assert_eq!(&payload[..2], &[0xB1, 0x07]);
        assert_eq!(&payload[2..], cfg.to_bytes().as_ref());
        assert_eq!(decode_config(&payload[2..]).unwrap(), cfg);
    }

    #[test]
    fn handshake_payload_layout() {
        let payload = build_down_handshake_payload(12, 2, 3);
        assert_eq!(payload.as_ref(), &[0xB2, 12, 0x02, 12, 0x00, 0x02, 0x03]);
    }

    #[test]
    fn default_handshake_uses_revision_one() {
        let payload = build_default_handshake_payload(255);
        assert_eq!(payload.len(), DOWN_HANDSHAKE_FRAME_SIZE);
        assert_eq!(payload.as_ref(), &[0xB2, 255, 0x02, 255, 0x00, 0x01, 0x01]);
    }
}

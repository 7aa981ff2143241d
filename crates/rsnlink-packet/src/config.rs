use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ensure_len, Result};
use crate::header::{Header, PacketType, HEADER_SIZE};

/// Header + 4 x u16 timings + 5 x u8 options = 18 bytes.
pub const CONFIG_SIZE: usize = HEADER_SIZE + 4 * 2 + 5;

pub const DEFAULT_SLEEP_TIME_S: u16 = 300;
pub const DEFAULT_PWR_UP_TIME_MS: u16 = 100;
pub const DEFAULT_SETTLING_TIME_MS: u16 = 150;
pub const DEFAULT_SAMPLING_INTERVAL_MS: u16 = 50;
pub const DEFAULT_LED_MODE: u8 = 0;
pub const DEFAULT_BATT_BUCKET: u8 = 1;
pub const DEFAULT_LOST_RX_LIMIT: u8 = 3;

/// Node configuration record.
///
/// Wire layout (little-endian, packed):
/// ```text
/// ┌────────────┬───────┬────────┬────────┬────────┬─────┬──────┬───────┬───────┬───────┐
/// │ Header(5B) │ sleep │ pwr_up │ settle │ sample │ led │ batt │ lostrx│ debug │ reset │
/// │            │ (2B)  │ (2B)   │ (2B)   │ (2B)   │(1B) │ (1B) │ (1B)  │ (1B)  │ (1B)  │
/// └────────────┴───────┴────────┴────────┴────────┴─────┴──────┴───────┴───────┴───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub header: Header,
    pub sleep_time_s: u16,
    pub pwr_up_time_ms: u16,
    pub settling_time_ms: u16,
    pub sampling_interval_ms: u16,
    pub led_mode_default: u8,
    pub batt_bucket: u8,
    pub lost_rx_limit: u8,
    pub debug_mode: u8,
    pub reset_flags: u8,
}

impl Config {
    /// Config addressed to `node_id` carrying the stock timings.
    pub fn for_node(node_id: u8) -> Self {
        Self {
            header: Header::new(PacketType::Config, node_id),
            sleep_time_s: DEFAULT_SLEEP_TIME_S,
            pwr_up_time_ms: DEFAULT_PWR_UP_TIME_MS,
            settling_time_ms: DEFAULT_SETTLING_TIME_MS,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            led_mode_default: DEFAULT_LED_MODE,
            batt_bucket: DEFAULT_BATT_BUCKET,
            lost_rx_limit: DEFAULT_LOST_RX_LIMIT,
            debug_mode: 0,
            reset_flags: 0,
        }
    }

    pub fn decode(src: &[u8]) -> Result<Self> {
        ensure_len("config", CONFIG_SIZE, src)?;
        let mut buf = src;
        let header = Header::read_from(&mut buf);
        Ok(Self {
            header,
            sleep_time_s: buf.get_u16_le(),
            pwr_up_time_ms: buf.get_u16_le(),
            settling_time_ms: buf.get_u16_le(),
            sampling_interval_ms: buf.get_u16_le(),
            led_mode_default: buf.get_u8(),
            batt_bucket: buf.get_u8(),
            lost_rx_limit: buf.get_u8(),
            debug_mode: buf.get_u8(),
            reset_flags: buf.get_u8(),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(CONFIG_SIZE);
        self.header.encode(dst);
        dst.put_u16_le(self.sleep_time_s);
        dst.put_u16_le(self.pwr_up_time_ms);
        dst.put_u16_le(self.settling_time_ms);
        dst.put_u16_le(self.sampling_interval_ms);
        dst.put_u8(self.led_mode_default);
        dst.put_u8(self.batt_bucket);
        dst.put_u8(self.lost_rx_limit);
        dst.put_u8(self.debug_mode);
        dst.put_u8(self.reset_flags);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(CONFIG_SIZE);
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Decode a CONFIG packet. Requires at least [`CONFIG_SIZE`] bytes.
pub fn decode_config(src: &[u8]) -> Result<Config> {
    Config::decode(src)
}

/// Encode a CONFIG packet into its fixed [`CONFIG_SIZE`]-byte layout.
pub fn encode_config(config: &Config) -> Bytes {
    config.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;
    use crate::header::Mode;

    fn sample() -> Config {
        Config {
            header: Header {
                pkt_type: PacketType::Config,
                node_id: 42,
                mode: Mode::Debug,
                hw_version: 3,
                fw_version: 6,
            },
            sleep_time_s: 0xBEEF,
            pwr_up_time_ms: 1,
            settling_time_ms: 65535,
            sampling_interval_ms: 0x0102,
            led_mode_default: 2,
            batt_bucket: 0,
            lost_rx_limit: 255,
            debug_mode: 1,
            reset_flags: 0x81,
        }
    }

    #[test]
    fn encode_is_fixed_size() {
        assert_eq!(CONFIG_SIZE, 18);
        assert_eq!(encode_config(&sample()).len(), CONFIG_SIZE);
        assert_eq!(encode_config(&Config::for_node(1)).len(), CONFIG_SIZE);
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let cfg = sample();
        let decoded = decode_config(&encode_config(&cfg)).unwrap();
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn stock_config_layout() {
        let bytes = encode_config(&Config::for_node(7));
        assert_eq!(
            bytes.as_ref(),
            &[
                0x04, 0x07, 0x00, 0x01, 0x01, // header
                0x2C, 0x01, // sleep 300
                0x64, 0x00, // pwr_up 100
                0x96, 0x00, // settle 150
                0x32, 0x00, // sample 50
                0x00, 0x01, 0x03, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn short_config_rejected() {
        let bytes = encode_config(&sample());
        for len in [0, 5, CONFIG_SIZE - 1] {
            let err = decode_config(&bytes[..len]).unwrap_err();
            assert_eq!(
                err,
                PacketError::ShortBuffer {
                    kind: "config",
                    required: CONFIG_SIZE,
                    actual: len,
                }
            );
        }
    }
}

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ensure_len, Result};
use crate::header::{Header, PacketType, HEADER_SIZE};

/// Statistics per sensor channel: mean, median, min, max, std (5 x u16).
pub const CHANNEL_STATS_SIZE: usize = 5 * 2;

/// Header + cycle (4) + ts_ms (4) + batt (1) + flags (1) + 3 channels + last_rssi (1) = 46 bytes.
pub const TELEMETRY_SIZE: usize = HEADER_SIZE + 4 + 4 + 1 + 1 + 3 * CHANNEL_STATS_SIZE + 1;

/// Telemetry flag bits reported by the node.
pub mod flags {
    pub const LOW_BATT: u8 = 1 << 0;
    pub const LOST_RX: u8 = 1 << 1;
    pub const DEBUG_MODE: u8 = 1 << 2;
    pub const WATCHDOG_RST: u8 = 1 << 3;
    pub const BROWNOUT_RST: u8 = 1 << 4;
    pub const FIRST_BOOT: u8 = 1 << 5;
}

/// Coarse battery level bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryStatus {
    Low,
    Medium,
    High,
    Other(u8),
}

impl From<u8> for BatteryStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => BatteryStatus::Low,
            1 => BatteryStatus::Medium,
            2 => BatteryStatus::High,
            other => BatteryStatus::Other(other),
        }
    }
}

impl From<BatteryStatus> for u8 {
    fn from(value: BatteryStatus) -> Self {
        match value {
            BatteryStatus::Low => 0,
            BatteryStatus::Medium => 1,
            BatteryStatus::High => 2,
            BatteryStatus::Other(raw) => raw,
        }
    }
}

/// Raw ADC statistics for one sensor channel over a sampling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub mean: u16,
    pub median: u16,
    pub min: u16,
    pub max: u16,
    pub std: u16,
}

impl ChannelStats {
    fn read_from(buf: &mut &[u8]) -> Self {
        Self {
            mean: buf.get_u16_le(),
            median: buf.get_u16_le(),
            min: buf.get_u16_le(),
            max: buf.get_u16_le(),
            std: buf.get_u16_le(),
        }
    }

    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u16_le(self.mean);
        dst.put_u16_le(self.median);
        dst.put_u16_le(self.min);
        dst.put_u16_le(self.max);
        dst.put_u16_le(self.std);
    }
}

/// One measurement cycle reported by a node.
///
/// Channels are laid out soil, vbat, ntc; each as mean, median, min, max, std.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    pub header: Header,
    pub cycle: u32,
    /// Node uptime clock at the end of the cycle.
    pub ts_ms: u32,
    pub batt_status: BatteryStatus,
    pub flags: u8,
    pub soil: ChannelStats,
    pub vbat: ChannelStats,
    pub ntc: ChannelStats,
    /// RSSI the node observed on its last downlink.
    pub last_rssi: i8,
}

impl Telemetry {
    pub fn new(node_id: u8, cycle: u32, ts_ms: u32) -> Self {
        Self {
            header: Header::new(PacketType::Telemetry, node_id),
            cycle,
            ts_ms,
            batt_status: BatteryStatus::High,
            flags: 0,
            soil: ChannelStats::default(),
            vbat: ChannelStats::default(),
            ntc: ChannelStats::default(),
            last_rssi: 0,
        }
    }

    pub fn decode(src: &[u8]) -> Result<Self> {
        ensure_len("telemetry", TELEMETRY_SIZE, src)?;
        let mut buf = src;
        let header = Header::read_from(&mut buf);
        Ok(Self {
            header,
            cycle: buf.get_u32_le(),
            ts_ms: buf.get_u32_le(),
            batt_status: BatteryStatus::from(buf.get_u8()),
            flags: buf.get_u8(),
            soil: ChannelStats::read_from(&mut buf),
            vbat: ChannelStats::read_from(&mut buf),
            ntc: ChannelStats::read_from(&mut buf),
            last_rssi: buf.get_i8(),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(TELEMETRY_SIZE);
        self.header.encode(dst);
        dst.put_u32_le(self.cycle);
        dst.put_u32_le(self.ts_ms);
        dst.put_u8(self.batt_status.into());
        dst.put_u8(self.flags);
        self.soil.encode(dst);
        self.vbat.encode(dst);
        self.ntc.encode(dst);
        dst.put_i8(self.last_rssi);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(TELEMETRY_SIZE);
        self.encode(&mut dst);
        dst.freeze()
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub fn low_battery(&self) -> bool {
        self.has_flag(flags::LOW_BATT)
    }

    pub fn lost_rx(&self) -> bool {
        self.has_flag(flags::LOST_RX)
    }

    /// True when the node reports a watchdog or brownout reset this cycle.
    pub fn abnormal_reset(&self) -> bool {
        self.has_flag(flags::WATCHDOG_RST | flags::BROWNOUT_RST)
    }
}

/// Decode a TELEMETRY packet. Requires at least [`TELEMETRY_SIZE`] bytes.
pub fn decode_telemetry(src: &[u8]) -> Result<Telemetry> {
    Telemetry::decode(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;

    fn sample() -> Telemetry {
        Telemetry {
            batt_status: BatteryStatus::Medium,
            flags: flags::LOW_BATT | flags::FIRST_BOOT,
            soil: ChannelStats {
                mean: 1,
                median: 2,
                min: 3,
                max: 4,
                std: 5,
            },
            vbat: ChannelStats {
                mean: 6,
                median: 7,
                min: 8,
                max: 9,
                std: 10,
            },
            ntc: ChannelStats {
                mean: 11,
                median: 12,
                min: 13,
                max: 14,
                std: 15,
            },
            last_rssi: -87,
            ..Telemetry::new(4, 0x0102_0304, 123_456)
        }
    }

    #[test]
    fn telemetry_size_is_46() {
        assert_eq!(TELEMETRY_SIZE, 46);
        assert_eq!(sample().to_bytes().len(), TELEMETRY_SIZE);
    }

    #[test]
    fn statistics_follow_channel_order() {
        let bytes = sample().to_bytes();
        // soil block starts after header(5) + cycle(4) + ts(4) + batt(1) + flags(1).
        let stats = &bytes[15..45];
        let values: Vec<u16> = stats
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(values, (1..=15).collect::<Vec<u16>>());
    }

    #[test]
    fn decode_reads_signed_rssi_and_counters() {
        let decoded = decode_telemetry(&sample().to_bytes()).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.last_rssi, -87);
        assert_eq!(decoded.cycle, 0x0102_0304);
        assert!(decoded.low_battery());
        assert!(!decoded.lost_rx());
        assert!(!decoded.abnormal_reset());
    }

    #[test]
    fn short_telemetry_rejected() {
        let bytes = sample().to_bytes();
        for len in 0..TELEMETRY_SIZE {
            let err = decode_telemetry(&bytes[..len]).unwrap_err();
            assert_eq!(
                err,
                PacketError::ShortBuffer {
                    kind: "telemetry",
                    required: TELEMETRY_SIZE,
                    actual: len,
                }
            );
        }
    }

    #[test]
    fn unknown_battery_status_passes_through() {
        let mut raw = sample().to_bytes().to_vec();
        raw[13] = 0x09;
        let decoded = decode_telemetry(&raw).unwrap();
        assert_eq!(decoded.batt_status, BatteryStatus::Other(9));
        assert_eq!(decoded.to_bytes().as_ref(), raw.as_slice());
    }
}

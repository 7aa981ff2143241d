//! Node settings document, as kept on the host and pushed as a CONFIG packet.

use std::path::{Path, PathBuf};

use rsnlink_packet::config::{
    DEFAULT_BATT_BUCKET, DEFAULT_LED_MODE, DEFAULT_LOST_RX_LIMIT, DEFAULT_PWR_UP_TIME_MS,
    DEFAULT_SAMPLING_INTERVAL_MS, DEFAULT_SETTLING_TIME_MS, DEFAULT_SLEEP_TIME_S,
};
use rsnlink_packet::Config;
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading node settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid node settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunable node parameters. Missing JSON fields take their defaults.
///
/// ```json
/// { "sleep_time_s": 60, "debug_mode": 1 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
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

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
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
}

impl NodeSettings {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the CONFIG packet for `node_id`.
    pub fn to_config(&self, node_id: u8) -> Config {
        Config {
            sleep_time_s: self.sleep_time_s,
            pwr_up_time_ms: self.pwr_up_time_ms,
            settling_time_ms: self.settling_time_ms,
            sampling_interval_ms: self.sampling_interval_ms,
            led_mode_default: self.led_mode_default,
            batt_bucket: self.batt_bucket,
            lost_rx_limit: self.lost_rx_limit,
            debug_mode: self.debug_mode,
            reset_flags: self.reset_flags,
            ..Config::for_node(node_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use rsnlink_frame::build_down_config_payload;
    use rsnlink_packet::{Mode, PacketType};

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = NodeSettings::from_json("{}").unwrap();
        assert_eq!(settings, NodeSettings::default());
        assert_eq!(settings.sleep_time_s, 300);
        assert_eq!(settings.pwr_up_time_ms, 100);
        assert_eq!(settings.settling_time_ms, 150);
        assert_eq!(settings.sampling_interval_ms, 50);
        assert_eq!(settings.batt_bucket, 1);
        assert_eq!(settings.lost_rx_limit, 3);
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let settings =
            NodeSettings::from_json(r#"{"sleep_time_s": 60, "debug_mode": 1, "note": "x"}"#)
                .unwrap();
        assert_eq!(settings.sleep_time_s, 60);
        assert_eq!(settings.debug_mode, 1);
        assert_eq!(settings.settling_time_ms, 150);
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let err = NodeSettings::from_json(r#"{"batt_bucket": 256}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn config_header_is_stock() {
        let config = NodeSettings::default().to_config(7);
        assert_eq!(config.header.pkt_type, PacketType::Config);
        assert_eq!(config.header.node_id, 7);
        assert_eq!(config.header.mode, Mode::Running);
        assert_eq!(config.header.hw_version, 1);
        assert_eq!(config.header.fw_version, 1);
        assert_eq!(config.sleep_time_s, 300);
    }

    #[test]
    fn settings_feed_downlink_payload() {
        let settings = NodeSettings {
            sleep_time_s: 0x0102,
            ..NodeSettings::default()
        };
        let payload = build_down_config_payload(7, &settings.to_config(7));
        assert_eq!(payload.len(), 20);
        assert_eq!(&payload[..2], &[0xB1, 0x07]);
        assert_eq!(&payload[7..9], &[0x02, 0x01]);
    }

    #[test]
    fn load_reads_file() {
        let path =
            std::env::temp_dir().join(format!("rsnlink-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"lost_rx_limit": 9}"#).unwrap();
        let settings = NodeSettings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(settings.lost_rx_limit, 9);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = NodeSettings::load("/nonexistent/rsnlink/settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}

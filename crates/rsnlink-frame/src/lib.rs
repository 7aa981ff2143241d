//! Gateway (TGW) frame routing.
//!
//! A payload exchanged with the gateway is an outer frame wrapping one node
//! packet:
//! - uplink: `[tag][node_id][rssi:i8]([local_ts_ms:u32 LE])[packet]`
//! - downlink: `[tag][node_id][packet]`
//!
//! [`parse_up_payload`] is the single dispatch point from raw payload bytes to
//! the closed [`UpFrame`] sum type. The `build_down_*` helpers produce command
//! payloads ready for the transport.

pub mod down;
pub mod error;
pub mod tag;
pub mod up;

pub use down::{
    build_default_handshake_payload, build_down_config_payload, build_down_handshake_payload,
    DOWN_CONFIG_FRAME_SIZE, DOWN_HANDSHAKE_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use tag::{
    is_downlink, is_uplink, tag_name, DOWN_CONFIG, DOWN_HANDSHAKE, UP_CONFIG_ACK, UP_HELLO,
    UP_TELEMETRY,
};
pub use up::{
    parse_up_payload, ConfigAckFrame, HelloFrame, TelemetryFrame, UpFrame,
    UP_CONFIG_ACK_FRAME_SIZE, UP_HELLO_FRAME_SIZE, UP_TELEMETRY_FRAME_SIZE,
};

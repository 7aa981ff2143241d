//! Fixed-layout binary codec for remote sensor node (RSN) packets.
//!
//! Every packet starts with the same 5-byte [`Header`] and is followed by a
//! kind-specific body. All multi-byte integers are little-endian and the
//! layouts are packed, matching the node firmware byte for byte.
//!
//! Decoding only checks length. Field values, including unknown packet types
//! and modes, pass through untouched.

pub mod ack;
pub mod config;
pub mod error;
pub mod header;
pub mod hello;
pub mod telemetry;

pub use ack::{decode_config_ack, ConfigAck, CONFIG_ACK_SIZE};
pub use config::{decode_config, encode_config, Config, CONFIG_SIZE};
pub use error::{PacketError, Result};
pub use header::{
    decode_header, Header, Mode, PacketType, DEFAULT_FW_VERSION, DEFAULT_HW_VERSION, HEADER_SIZE,
};
pub use hello::{decode_hello, Hello, HELLO_SIZE};
pub use telemetry::{
    decode_telemetry, flags, BatteryStatus, ChannelStats, Telemetry, TELEMETRY_SIZE,
};

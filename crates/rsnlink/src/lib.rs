//! Host-side link to remote sensor nodes (RSN) through a telemetry gateway (TGW).
//!
//! The gateway relays node packets over a serial line. This crate ties the
//! three layers together and adds the pieces a host program needs on top.
//!
//! # Crate Structure
//!
//! - [`packet`]: fixed-layout codec for node packets
//! - [`frame`]: gateway frame routing, uplink parsing and downlink builders
//! - [`transport`]: length-prefixed serial link with a background reader
//! - [`dispatch`]: turns transport payloads into typed frames for a consumer
//! - [`settings`]: JSON node settings (behind the `settings` feature)
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use rsnlink::dispatch::frame_channel;
//! use rsnlink::frame::build_default_handshake_payload;
//! use rsnlink::transport::{LinkConfig, SerialTransport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let link = SerialTransport::serial("/dev/ttyUSB0", LinkConfig::default());
//! link.open()?;
//!
//! let (dispatcher, frames) = frame_channel();
//! link.start_reader(dispatcher)?;
//! link.send_payload(&build_default_handshake_payload(5))?;
//!
//! while let Ok(frame) = frames.recv_timeout(Duration::from_secs(10)) {
//!     println!("node {} rssi {}", frame.node_id(), frame.rssi());
//! }
//! link.close();
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
#[cfg(feature = "settings")]
pub mod settings;

/// Re-export packet codec types.
pub mod packet {
    pub use rsnlink_packet::*;
}

/// Re-export frame routing types.
pub mod frame {
    pub use rsnlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use rsnlink_transport::*;
}

pub use dispatch::{frame_channel, DispatchStats, FrameDispatcher, FrameSink};
#[cfg(feature = "settings")]
pub use settings::{NodeSettings, SettingsError};

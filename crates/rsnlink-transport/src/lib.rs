//! Serial link to the telemetry gateway.
//!
//! Every frame on the wire is a 2-byte little-endian length followed by that
//! many payload bytes. [`SerialTransport`] owns the duplex stream, runs one
//! background reader thread that hands each payload to a [`PayloadHandler`],
//! and writes outbound payloads synchronously.
//!
//! ```no_run
//! use rsnlink_transport::{HandlerError, LinkConfig, SerialTransport};
//!
//! # fn main() -> rsnlink_transport::Result<()> {
//! let link = SerialTransport::serial("/dev/ttyUSB0", LinkConfig::default());
//! link.open()?;
//! link.start_reader(|payload: bytes::Bytes| -> Result<(), HandlerError> {
//!     println!("{} bytes from gateway", payload.len());
//!     Ok(())
//! })?;
//! link.send_payload(&[0xB2, 0x05, 0x01, 0x01])?;
//! link.close();
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod link;
pub mod reader;
pub mod serial;
pub mod transport;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::LengthPrefixCodec;
pub use codec::{
    decode_frame, encode_frame, LinkConfig, DEFAULT_BAUD_RATE, DEFAULT_MAX_INBOUND,
    LEN_PREFIX_SIZE, MAX_OUTBOUND_PAYLOAD,
};
pub use error::{Result, TransportError};
pub use link::{Link, LinkOpener};
pub use reader::{HandlerError, LinkReader, PayloadHandler, ReaderExit};
pub use serial::{auto_detect_port, available_ports, PortInfo, SerialOpener};
pub use transport::SerialTransport;
pub use writer::LinkWriter;

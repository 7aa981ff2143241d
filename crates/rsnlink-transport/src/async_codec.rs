//! `tokio_util::codec` adapter for the gateway wire format.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, DEFAULT_MAX_INBOUND};
use crate::error::TransportError;

/// Length-prefixed framing for `FramedRead`/`FramedWrite`.
///
/// Applies the same inbound rules as the blocking reader: a length of zero or
/// above the cap is discarded two bytes at a time.
#[derive(Debug, Clone, Copy)]
pub struct LengthPrefixCodec {
    max_inbound_len: usize,
}

impl LengthPrefixCodec {
    pub fn new() -> Self {
        Self::with_max_inbound(DEFAULT_MAX_INBOUND)
    }

    pub fn with_max_inbound(max_inbound_len: usize) -> Self {
        Self { max_inbound_len }
    }
}

impl Default for LengthPrefixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LengthPrefixCodec {
    type Item = Bytes;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(decode_frame(src, self.max_inbound_len))
    }
}

impl Encoder<Bytes> for LengthPrefixCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, dst)
    }
}

//! Routing of transport payloads to a frame consumer.
//!
//! [`FrameDispatcher`] is the glue between the reader thread and whatever
//! stores or displays frames. It runs on the reader thread, so sinks should
//! hand frames off quickly; [`frame_channel`] does exactly that.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use bytes::Bytes;
use rsnlink_frame::{is_downlink, is_uplink, parse_up_payload, tag_name, UpFrame};
use rsnlink_packet::PacketType;
use rsnlink_transport::{HandlerError, PayloadHandler};
use tracing::{debug, warn};

/// Consumer of decoded uplink frames.
pub trait FrameSink: Send {
    fn on_frame(&mut self, frame: UpFrame);
}

impl FrameSink for Sender<UpFrame> {
    fn on_frame(&mut self, frame: UpFrame) {
        if self.send(frame).is_err() {
            debug!(node_id = frame.node_id(), "frame receiver gone; frame dropped");
        }
    }
}

impl<F> FrameSink for F
where
    F: FnMut(UpFrame) + Send,
{
    fn on_frame(&mut self, frame: UpFrame) {
        self(frame)
    }
}

/// Frame counters shared between a dispatcher and its owner.
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl DispatchStats {
    /// Frames handed to the sink.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Payloads that were malformed or of an unknown type.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Parses each payload and forwards valid frames to a [`FrameSink`].
///
/// Malformed and unknown payloads are logged and counted, never returned as
/// errors, so one bad frame costs exactly one warning.
pub struct FrameDispatcher<S> {
    sink: S,
    stats: Arc<DispatchStats>,
}

impl<S: FrameSink> FrameDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Counters that stay readable after the dispatcher moves to the reader.
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Parse one payload and deliver it. Returns true if a frame was delivered.
    pub fn dispatch(&mut self, payload: &[u8]) -> bool {
        match parse_up_payload(payload) {
            Ok(frame) => {
                trace_inner_mismatch(&frame);
                self.sink.on_frame(frame);
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(err) => {
                if err.is_unknown_type() {
                    let tag = payload.first().copied().unwrap_or_default();
                    warn!(
                        tag,
                        direction = tag_direction(tag),
                        len = payload.len(),
                        "unknown frame type"
                    );
                } else {
                    warn!(len = payload.len(), err = %err, "frame parse failed");
                }
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: FrameSink> PayloadHandler for FrameDispatcher<S> {
    fn on_payload(&mut self, payload: Bytes) -> Result<(), HandlerError> {
        self.dispatch(&payload);
        Ok(())
    }
}

/// A dispatcher that forwards into a channel, and the receiving end.
pub fn frame_channel() -> (FrameDispatcher<Sender<UpFrame>>, Receiver<UpFrame>) {
    let (tx, rx) = mpsc::channel();
    (FrameDispatcher::new(tx), rx)
}

// A downlink tag arriving here was echoed or misrouted; an unassigned uplink
// tag is more likely newer gateway firmware.
fn tag_direction(tag: u8) -> &'static str {
    if is_downlink(tag) {
        "downlink"
    } else if is_uplink(tag) {
        "uplink"
    } else {
        "unknown"
    }
}

// The outer prefix is authoritative; a disagreeing inner header is only noted.
fn trace_inner_mismatch(frame: &UpFrame) {
    let expected = match frame {
        UpFrame::Hello(_) => PacketType::Hello,
        UpFrame::Telemetry(_) => PacketType::Telemetry,
        UpFrame::ConfigAck(_) => PacketType::ConfigAck,
    };
    let inner = frame.inner_header();
    if inner.node_id != frame.node_id() || inner.pkt_type != expected {
        debug!(
            frame = tag_name(frame.tag()),
            node_id = frame.node_id(),
            inner_node_id = inner.node_id,
            inner_type = inner.pkt_type.name(),
            "inner header disagrees with frame prefix"
        );
    }
}

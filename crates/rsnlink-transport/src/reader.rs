use std::io::{self, ErrorKind, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::codec::{DEFAULT_MAX_INBOUND, LEN_PREFIX_SIZE};

/// Error type a payload handler may return; it is logged and dropped.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every payload the reader extracts, on the reader thread.
pub trait PayloadHandler: Send {
    fn on_payload(&mut self, payload: Bytes) -> Result<(), HandlerError>;
}

impl<F> PayloadHandler for F
where
    F: FnMut(Bytes) -> Result<(), HandlerError> + Send,
{
    fn on_payload(&mut self, payload: Bytes) -> Result<(), HandlerError> {
        self(payload)
    }
}

/// Why a reader loop returned.
#[derive(Debug)]
pub enum ReaderExit {
    /// The stop flag was raised.
    Stopped,
    /// The stream failed; the link must be reopened.
    Fault(io::Error),
}

/// Extracts length-prefixed payloads from a blocking `Read` stream.
///
/// Reads time out at the stream's own read timeout. A read that times out
/// before the requested bytes arrive abandons the current frame; nothing is
/// carried over into the next attempt.
pub struct LinkReader<T> {
    inner: T,
    max_payload: usize,
}

impl<T: Read> LinkReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_INBOUND)
    }

    pub fn with_max_payload(inner: T, max_payload: usize) -> Self {
        Self { inner, max_payload }
    }

    /// Attempt to read one frame.
    ///
    /// Returns `Ok(None)` when the attempt was abandoned: a timeout or stop
    /// request cut a read short, or the length prefix was 0 or over the cap.
    /// Any `Err` is a stream failure.
    pub fn next_payload(&mut self, stop: &AtomicBool) -> io::Result<Option<Bytes>> {
        let mut prefix = [0u8; LEN_PREFIX_SIZE];
        let got = self.read_exact_or_stop(&mut prefix, stop)?;
        if got < LEN_PREFIX_SIZE {
            if got > 0 {
                debug!(got, "partial length prefix discarded");
            }
            return Ok(None);
        }

        let len = u16::from_le_bytes(prefix) as usize;
        if len == 0 || len > self.max_payload {
            debug!(len, max = self.max_payload, "discarding corrupt frame length");
            return Ok(None);
        }

        let mut payload = vec![0u8; len];
        let got = self.read_exact_or_stop(&mut payload, stop)?;
        if got < len {
            debug!(expected = len, got, "short payload discarded");
            return Ok(None);
        }

        Ok(Some(Bytes::from(payload)))
    }

    /// Run until `stop` is raised or the stream fails, handing each payload to
    /// `handler`. Handler errors and panics are logged and do not end the loop.
    /// A stream error seen after `stop` was raised counts as a stop, since the
    /// stream may already have been released under the reader.
    pub fn run<H>(&mut self, handler: &mut H, stop: &AtomicBool) -> ReaderExit
    where
        H: PayloadHandler + ?Sized,
    {
        let exit = loop {
            if stop.load(Ordering::Acquire) {
                break ReaderExit::Stopped;
            }
            match self.next_payload(stop) {
                Ok(Some(payload)) => deliver(handler, payload),
                Ok(None) => continue,
                Err(err) if stop.load(Ordering::Acquire) => {
                    debug!(err = %err, "stream error after stop");
                    break ReaderExit::Stopped;
                }
                Err(err) => {
                    error!(err = %err, "link stream error");
                    break ReaderExit::Fault(err);
                }
            }
        };
        info!("link reader exited");
        exit
    }

    // Fill `buf`, returning how many bytes arrived before a timeout or stop.
    fn read_exact_or_stop(&mut self, buf: &mut [u8], stop: &AtomicBool) -> io::Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() && !stop.load(Ordering::Acquire) {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "link stream closed by peer",
                    ))
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    break
                }
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn deliver<H>(handler: &mut H, payload: Bytes)
where
    H: PayloadHandler + ?Sized,
{
    let len = payload.len();
    match catch_unwind(AssertUnwindSafe(|| handler.on_payload(payload))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(len, err = %err, "payload handler failed"),
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(len, panic = %msg, "payload handler panicked");
        }
    }
}

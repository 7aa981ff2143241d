use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::codec::LinkConfig;
use crate::error::{Result, TransportError};
use crate::link::{Link, LinkOpener};
use crate::reader::{LinkReader, PayloadHandler, ReaderExit};
use crate::serial::SerialOpener;
use crate::writer::LinkWriter;

const READER_THREAD_NAME: &str = "rsnlink-reader";

struct ReaderTask {
    stop: Arc<AtomicBool>,
    done: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

type LinkSlot = Arc<Mutex<Option<Box<dyn Link>>>>;

#[derive(Default)]
struct LinkState {
    reader_half: Option<LinkSlot>,
    reader: Option<ReaderTask>,
}

/// Reader half as seen by the reader thread.
///
/// The slot is locked for one read at a time, never while a handler runs, so
/// `close` can always take the stream within one read timeout. An emptied
/// slot raises the stop flag.
struct SharedLink {
    slot: LinkSlot,
    stop: Arc<AtomicBool>,
}

impl Read for SharedLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match lock(&self.slot).as_mut() {
            Some(link) => link.read(buf),
            None => {
                self.stop.store(true, Ordering::Release);
                Err(ErrorKind::Interrupted.into())
            }
        }
    }
}

/// Duplex link to the gateway.
///
/// Owns the stream, one background reader thread, and a writer half that any
/// thread may send through. Concurrent senders are serialized so frames never
/// interleave on the wire.
///
/// Lock order is `state` then `writer`.
pub struct SerialTransport {
    opener: Mutex<Box<dyn LinkOpener>>,
    config: LinkConfig,
    state: Mutex<LinkState>,
    writer: Mutex<Option<LinkWriter<Box<dyn Link>>>>,
    fault: Arc<Mutex<Option<io::Error>>>,
}

impl SerialTransport {
    pub fn new(opener: impl LinkOpener + 'static, config: LinkConfig) -> Self {
        Self {
            opener: Mutex::new(Box::new(opener)),
            config,
            state: Mutex::new(LinkState::default()),
            writer: Mutex::new(None),
            fault: Arc::new(Mutex::new(None)),
        }
    }

    /// Transport over a serial device such as `/dev/ttyUSB0`.
    pub fn serial(port: impl Into<String>, config: LinkConfig) -> Self {
        let opener = SerialOpener::new(port, &config);
        Self::new(opener, config)
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Acquire the underlying stream.
    pub fn open(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let mut writer = lock(&self.writer);
        if writer.is_some() {
            return Err(TransportError::AlreadyOpen);
        }

        let mut opener = lock(&self.opener);
        let port = opener.describe();
        let link = opener
            .open()
            .map_err(|source| TransportError::Unavailable {
                port: port.clone(),
                source,
            })?;
        let reader_half = link
            .try_clone_link()
            .map_err(|source| TransportError::Unavailable {
                port: port.clone(),
                source,
            })?;

        state.reader_half = Some(Arc::new(Mutex::new(Some(reader_half))));
        *writer = Some(LinkWriter::new(link));
        *lock(&self.fault) = None;
        info!(port = %port, "link opened");
        Ok(())
    }

    /// Spawn the background reader. `handler` runs on the reader thread for
    /// every payload extracted from the stream.
    pub fn start_reader<H>(&self, handler: H) -> Result<()>
    where
        H: PayloadHandler + 'static,
    {
        let mut state = lock(&self.state);
        if lock(&self.writer).is_none() {
            return Err(TransportError::NotOpen);
        }
        if state.reader.is_some() {
            return Err(TransportError::ReaderAlreadyStarted);
        }
        let slot = state
            .reader_half
            .as_ref()
            .map(Arc::clone)
            .ok_or(TransportError::NotOpen)?;

        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel();
        let fault = Arc::clone(&self.fault);
        let thread_stop = Arc::clone(&stop);
        let max_payload = self.config.max_inbound_len;
        let mut handler = handler;

        let handle = thread::Builder::new()
            .name(READER_THREAD_NAME.to_string())
            .spawn(move || {
                let stream = SharedLink {
                    slot,
                    stop: Arc::clone(&thread_stop),
                };
                let mut reader = LinkReader::with_max_payload(stream, max_payload);
                if let ReaderExit::Fault(err) = reader.run(&mut handler, &thread_stop) {
                    *lock(&fault) = Some(err);
                }
                let _ = done_tx.send(());
            })
            .map_err(TransportError::Spawn)?;

        state.reader = Some(ReaderTask {
            stop,
            done: done_rx,
            handle,
        });
        debug!(max_payload, "reader started");
        Ok(())
    }

    /// Stop the reader and release the stream.
    ///
    /// Waits up to `close_grace` for the reader thread. If it has not exited
    /// by then it is detached and both halves of the stream are dropped
    /// anyway, so a handler still running may outlive this call but the device
    /// does not. Calling `close` again is a no-op.
    pub fn close(&self) {
        let (slot, task) = {
            let mut state = lock(&self.state);
            (state.reader_half.take(), state.reader.take())
        };

        if let Some(task) = task {
            task.stop.store(true, Ordering::Release);
            match task.done.recv_timeout(self.config.close_grace) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if task.handle.join().is_err() {
                        warn!("reader thread panicked");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        grace_ms = self.config.close_grace.as_millis() as u64,
                        "reader did not stop in time; detaching"
                    );
                }
            }
        }

        if let Some(slot) = slot {
            drop(lock(&slot).take());
        }
        if lock(&self.writer).take().is_some() {
            info!("link closed");
        }
    }

    /// Frame and write one payload, blocking until it is flushed.
    pub fn send_payload(&self, payload: &[u8]) -> Result<()> {
        let mut guard = lock(&self.writer);
        let writer = guard.as_mut().ok_or(TransportError::Closed)?;
        writer.send(payload)?;
        debug!(len = payload.len(), "payload sent");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        lock(&self.writer).is_some()
    }

    /// True while a started reader thread has not yet exited.
    pub fn reader_running(&self) -> bool {
        lock(&self.state)
            .reader
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// The stream error that ended the reader, if any. Cleared on read.
    pub fn take_fault(&self) -> Option<io::Error> {
        lock(&self.fault).take()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

use std::io::{self, Read, Write};

/// A duplex byte stream to the gateway.
///
/// The reader thread and senders each own one half, obtained with
/// [`Link::try_clone_link`], so reads and writes never wait on each other.
pub trait Link: Read + Write + Send {
    /// Create another handle to the same underlying stream.
    fn try_clone_link(&self) -> io::Result<Box<dyn Link>>;
}

/// Produces a fresh [`Link`] each time the transport is opened.
pub trait LinkOpener: Send {
    fn open(&mut self) -> io::Result<Box<dyn Link>>;

    /// Name of the device for logs and errors.
    fn describe(&self) -> String {
        "custom link".to_string()
    }
}

impl<F> LinkOpener for F
where
    F: FnMut() -> io::Result<Box<dyn Link>> + Send,
{
    fn open(&mut self) -> io::Result<Box<dyn Link>> {
        self()
    }
}

#[cfg(unix)]
impl Link for std::os::unix::net::UnixStream {
    fn try_clone_link(&self) -> io::Result<Box<dyn Link>> {
        Ok(Box::new(self.try_clone()?))
    }
}

/// Errors that can occur on the gateway link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying device could not be opened.
    #[error("link unavailable on {port}: {source}")]
    Unavailable {
        port: String,
        source: std::io::Error,
    },

    /// `open` was called on a link that is already open.
    #[error("link already open")]
    AlreadyOpen,

    /// The operation needs an open link.
    #[error("link not open")]
    NotOpen,

    /// A send was attempted after the link was closed (or before it was opened).
    #[error("link closed")]
    Closed,

    /// A reader is already running for this link.
    #[error("reader already started")]
    ReaderAlreadyStarted,

    /// The payload does not fit the 16-bit length prefix.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred on the open stream.
    #[error("link stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// The reader thread could not be spawned.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(std::io::Error),
}

impl TransportError {
    /// Returns true if the error came from the physical stream rather than
    /// from how the link was used.
    pub fn is_stream_failure(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable { .. } | TransportError::Stream(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

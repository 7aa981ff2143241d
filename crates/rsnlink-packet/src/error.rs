/// Errors that can occur while decoding node packets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    /// The buffer is shorter than the fixed layout of the packet kind.
    #[error("{kind} packet too short ({actual} bytes, need {required})")]
    ShortBuffer {
        kind: &'static str,
        required: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, PacketError>;

/// Fail with `ShortBuffer` unless `src` holds at least `required` bytes.
pub(crate) fn ensure_len(kind: &'static str, required: usize, src: &[u8]) -> Result<()> {
    if src.len() < required {
        tracing::trace!(kind, required, actual = src.len(), "short packet buffer");
        return Err(PacketError::ShortBuffer {
            kind,
            required,
            actual: src.len(),
        });
    }
    Ok(())
}

use std::io::ErrorKind;

/// Errors that can occur on a transport stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred while reading or writing the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before the requested bytes were transferred.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Map a failed `read_exact` to the transport contract: EOF mid-read
    /// means the peer (or a local `shutdown`) closed the stream.
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == ErrorKind::UnexpectedEof {
            TransportError::Closed
        } else {
            TransportError::Io(err)
        }
    }

    /// Map a failed `write_all`. A write of zero bytes surfaces as
    /// `WriteZero`, which means the stream is gone.
    pub(crate) fn from_write(err: std::io::Error) -> Self {
        if err.kind() == ErrorKind::WriteZero {
            TransportError::Closed
        } else {
            TransportError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

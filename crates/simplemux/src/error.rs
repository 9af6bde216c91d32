use std::sync::Arc;
use std::time::Duration;

use simplemux_frame::FrameError;
use simplemux_transport::TransportError;

/// Errors surfaced by the multiplexer and its sessions.
///
/// The enum is `Clone` so one fatal reader error can be broadcast to
/// every live session's error signal; non-clonable sources are shared
/// through `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MuxError {
    /// Invalid configuration, or a protocol error in an inbound frame
    /// (parse failure, negative body length).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport failed or was closed underneath the multiplexer.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<TransportError>),

    /// The multiplexer has been closed.
    #[error("mux closed")]
    MuxClosed,

    /// The session has been closed.
    #[error("session closed")]
    SessionClosed,

    /// `receive` elapsed its configured timeout with no frame.
    #[error("receive timed out after {0:?}")]
    ReceiveTimeout(Duration),
}

impl MuxError {
    /// True only for a `receive` timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MuxError::ReceiveTimeout(_))
    }
}

impl From<TransportError> for MuxError {
    fn from(err: TransportError) -> Self {
        MuxError::Transport(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, MuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_timeout_only_for_timeouts() {
        assert!(MuxError::ReceiveTimeout(Duration::from_secs(1)).is_timeout());
        assert!(!MuxError::MuxClosed.is_timeout());
        assert!(!MuxError::SessionClosed.is_timeout());
        assert!(!MuxError::Frame(FrameError::NegativeBodyLength(-1)).is_timeout());
    }

    #[test]
    fn broadcast_errors_clone() {
        let err = MuxError::from(TransportError::Closed);
        let copy = err.clone();
        assert!(matches!(copy, MuxError::Transport(_)));
    }
}

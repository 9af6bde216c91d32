use std::sync::Arc;

/// Errors in the frame contract: construction-time configuration errors
/// and protocol errors surfaced while decoding inbound frames.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrameError {
    /// The configured header size is outside the accepted range.
    #[error("header size {size} out of range ({min}..={max} bytes)")]
    HeaderSizeOutOfRange {
        size: usize,
        min: usize,
        max: usize,
    },

    /// No header parser was supplied at construction.
    #[error("a header parser is required")]
    MissingParser,

    /// The parsed header carries a negative body length.
    #[error("negative body length {0}")]
    NegativeBodyLength(i64),

    /// The caller-supplied parser rejected a header.
    #[error("header parse error: {0}")]
    Parse(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, FrameError>;

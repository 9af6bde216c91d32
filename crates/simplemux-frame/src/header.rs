use std::fmt;

use crate::error::{FrameError, Result};

/// Smallest accepted fixed header size in bytes.
pub const MIN_HEADER_SIZE: usize = 9;

/// Largest accepted fixed header size in bytes.
pub const MAX_HEADER_SIZE: usize = 1024;

/// A parsed protocol header.
///
/// The header layout belongs to the peer's protocol; the multiplexer
/// only needs the two fields it routes on. The session id must be
/// echoed back unchanged by the peer for frames to reach their session.
pub trait MuxHeader: Send + Sync + fmt::Debug {
    /// Session id embedded in the header.
    fn session_id(&self) -> u64;

    /// Body length announced by the header. Negative is a protocol
    /// error and shuts the multiplexer down.
    fn body_len(&self) -> i64;
}

/// Error type returned by a [`HeaderParser`].
pub type ParseError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-supplied header parse function.
///
/// Invoked with a slice of exactly the configured header size. The
/// parser must be pure and must not retain the slice — the multiplexer
/// reuses one header buffer across reads.
pub type HeaderParser =
    Box<dyn Fn(&[u8]) -> std::result::Result<Box<dyn MuxHeader>, ParseError> + Send + Sync>;

/// Check a fixed header size against the accepted range.
pub fn validate_header_size(size: usize) -> Result<()> {
    if !(MIN_HEADER_SIZE..=MAX_HEADER_SIZE).contains(&size) {
        return Err(FrameError::HeaderSizeOutOfRange {
            size,
            min: MIN_HEADER_SIZE,
            max: MAX_HEADER_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(validate_header_size(MIN_HEADER_SIZE).is_ok());
        assert!(validate_header_size(12).is_ok());
        assert!(validate_header_size(MAX_HEADER_SIZE).is_ok());
    }

    #[test]
    fn rejects_outside_bounds() {
        for size in [0, MIN_HEADER_SIZE - 1, MAX_HEADER_SIZE + 1] {
            let err = validate_header_size(size).expect_err("size should be rejected");
            assert!(matches!(
                err,
                FrameError::HeaderSizeOutOfRange { size: s, min: 9, max: 1024 } if s == size
            ));
        }
    }
}

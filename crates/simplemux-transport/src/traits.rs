use crate::error::Result;

/// A connected, reliable, ordered, bidirectional byte stream.
///
/// All methods take `&self` so that one thread can sit in a blocking
/// `read_exact` while other threads write, the way the std socket types
/// allow I/O through a shared reference. Implementations must guarantee:
///
/// - `read_exact` blocks until the buffer is filled or the stream fails;
///   a stream that ends mid-buffer is an error, never a short read.
/// - `write_all` blocks until every byte is accepted or the stream fails.
/// - `shutdown` tears the stream down and unblocks a `read_exact`
///   pending in another thread with an error.
pub trait Transport: Send + Sync {
    /// Read exactly `buf.len()` bytes (blocking).
    fn read_exact(&self, buf: &mut [u8]) -> Result<()>;

    /// Write all of `buf` (blocking).
    fn write_all(&self, buf: &[u8]) -> Result<()>;

    /// Shut the stream down in both directions.
    ///
    /// Idempotent from the caller's perspective: repeated shutdowns may
    /// return an error but have no further effect on the stream.
    fn shutdown(&self) -> Result<()>;
}

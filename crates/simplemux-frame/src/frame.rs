use bytes::Bytes;

use crate::header::MuxHeader;

/// One protocol frame received from the peer: the parsed header and the
/// body bytes that followed it on the wire.
#[derive(Debug)]
pub struct Frame {
    /// The parsed header, as produced by the caller's parser.
    pub header: Box<dyn MuxHeader>,
    /// The frame body. Empty when the header announced a zero length.
    pub body: Bytes,
}

impl Frame {
    /// Create a frame from a parsed header and its body.
    pub fn new(header: Box<dyn MuxHeader>, body: impl Into<Bytes>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// Session id from the header.
    pub fn session_id(&self) -> u64 {
        self.header.session_id()
    }

    /// Body length in bytes.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

//! Frame model and header-parser contract for simplemux.
//!
//! The multiplexer never interprets header bytes itself: the peer's
//! protocol defines the header layout, and the caller supplies a parser
//! that extracts the two fields the mux routes on — a 64-bit session id
//! and a body length. This crate holds that contract:
//!
//! - [`MuxHeader`], the parsed-header accessor trait
//! - [`HeaderParser`], the caller-supplied parse function
//! - [`Frame`], one header plus its (possibly empty) body
//! - the fixed header-size bounds accepted at mux construction

pub mod error;
pub mod frame;
pub mod header;

pub use error::{FrameError, Result};
pub use frame::Frame;
pub use header::{
    validate_header_size, HeaderParser, MuxHeader, ParseError, MAX_HEADER_SIZE, MIN_HEADER_SIZE,
};

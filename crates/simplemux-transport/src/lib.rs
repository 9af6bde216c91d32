//! Blocking byte-stream transport contract for simplemux.
//!
//! A multiplexer owns exactly one connected, reliable, ordered,
//! bidirectional byte stream for its lifetime. This crate defines that
//! contract as the [`Transport`] trait and implements it for the std
//! socket types:
//! - TCP streams (all platforms)
//! - Unix domain socket streams (Unix)
//!
//! Dialing, listening, and accepting are the caller's responsibility;
//! only the connected stream is handed to the multiplexer.

pub mod error;
pub mod traits;

pub mod tcp;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use traits::Transport;

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

impl Transport for UnixStream {
    fn read_exact(&self, buf: &mut [u8]) -> Result<()> {
        let mut stream = self;
        Read::read_exact(&mut stream, buf).map_err(TransportError::from_read)
    }

    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut stream = self;
        Write::write_all(&mut stream, buf).map_err(TransportError::from_write)
    }

    fn shutdown(&self) -> Result<()> {
        debug!("shutting down unix stream");
        UnixStream::shutdown(self, Shutdown::Both).map_err(Into::into)
    }
}

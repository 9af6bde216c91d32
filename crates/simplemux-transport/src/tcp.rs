use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

impl Transport for TcpStream {
    fn read_exact(&self, buf: &mut [u8]) -> Result<()> {
        let mut stream = self;
        Read::read_exact(&mut stream, buf).map_err(TransportError::from_read)
    }

    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut stream = self;
        Write::write_all(&mut stream, buf).map_err(TransportError::from_write)
    }

    fn shutdown(&self) -> Result<()> {
        debug!("shutting down tcp stream");
        TcpStream::shutdown(self, Shutdown::Both).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    #[test]
    fn roundtrip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("listener should accept");
            let mut buf = [0u8; 4];
            Transport::read_exact(&stream, &mut buf).expect("server should read");
            Transport::write_all(&stream, &buf).expect("server should echo");
        });

        let client = TcpStream::connect(addr).expect("client should connect");
        Transport::write_all(&client, b"ping").expect("client should write");
        let mut buf = [0u8; 4];
        Transport::read_exact(&client, &mut buf).expect("client should read");
        assert_eq!(&buf, b"ping");

        server.join().expect("server thread should finish");
    }

    #[test]
    fn read_after_peer_close_reports_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("listener should accept");
            drop(stream);
        });

        let client = TcpStream::connect(addr).expect("client should connect");
        server.join().expect("server thread should finish");

        let mut buf = [0u8; 1];
        let err = Transport::read_exact(&client, &mut buf).expect_err("read should fail");
        assert!(matches!(err, TransportError::Closed));
    }
}
